// Unit tests for validation rules

use super::*;
use crate::domain::errors::ValidationError;

#[test]
fn test_trim_requires_ordered_bounds() {
    assert!(validate(Operation::trim(0.0, 10.0)).is_ok());
    assert_eq!(
        validate(Operation::trim(5.0, 5.0)),
        Err(ValidationError::InvalidTrimRange {
            start: 5.0,
            end: 5.0
        })
    );
    assert_eq!(
        validate(Operation::trim(8.0, 3.0)),
        Err(ValidationError::InvalidTrimRange {
            start: 8.0,
            end: 3.0
        })
    );
}

#[test]
fn test_trim_rejects_negative_start() {
    assert_eq!(
        validate(Operation::trim(-1.0, 3.0)),
        Err(ValidationError::NegativeTrimStart { start: -1.0 })
    );
}

#[test]
fn test_trim_rejects_non_finite() {
    assert!(matches!(
        validate(Operation::trim(0.0, f64::INFINITY)),
        Err(ValidationError::NonFinite { field: "endTime" })
    ));
    assert!(matches!(
        validate(Operation::trim(f64::NAN, 2.0)),
        Err(ValidationError::NonFinite { field: "startTime" })
    ));
}

#[test]
fn test_resize_requires_positive_dimensions() {
    assert!(validate(Operation::resize(1280, 720)).is_ok());
    assert!(validate(Operation::resize(0, 720)).is_err());
    assert!(validate(Operation::resize(1280, 0)).is_err());
}

#[test]
fn test_rotate_accepts_any_finite_angle() {
    assert!(validate(Operation::rotate(450.0)).is_ok());
    assert!(validate(Operation::rotate(-1234.5)).is_ok());
    assert!(validate(Operation::rotate(f64::NAN)).is_err());
}

#[test]
fn test_crop_ranges() {
    assert!(validate(Operation::crop(0.0, 0.0, 100.0, 100.0)).is_ok());
    assert!(validate(Operation::crop(100.0, 100.0, 1.0, 1.0)).is_ok());

    assert!(matches!(
        validate(Operation::crop(-1.0, 0.0, 50.0, 50.0)),
        Err(ValidationError::CropOutOfRange { field: "x", .. })
    ));
    assert!(matches!(
        validate(Operation::crop(0.0, 101.0, 50.0, 50.0)),
        Err(ValidationError::CropOutOfRange { field: "y", .. })
    ));
    assert!(matches!(
        validate(Operation::crop(0.0, 0.0, 0.0, 50.0)),
        Err(ValidationError::CropOutOfRange { field: "width", .. })
    ));
    assert!(matches!(
        validate(Operation::crop(0.0, 0.0, 50.0, 100.5)),
        Err(ValidationError::CropOutOfRange {
            field: "height",
            ..
        })
    ));
}

#[test]
fn test_crop_overflow_is_tolerated() {
    // 60 + 50 > 100 is a warning, not an error
    let op = validate(Operation::crop(60.0, 0.0, 50.0, 30.0)).unwrap();
    assert_eq!(op, Operation::crop(60.0, 0.0, 50.0, 30.0));
    assert_eq!(crop_overflow(60.0, 0.0, 50.0, 30.0), Some((110.0, 30.0)));
    assert_eq!(crop_overflow(50.0, 50.0, 50.0, 50.0), None);
}

#[test]
fn test_filter_intensity_bounds() {
    let ok = FilterSet::new()
        .with(FilterKind::Brightness, 0)
        .with(FilterKind::Blur, 200);
    assert!(validate(Operation::filters(ok)).is_ok());

    let too_strong = FilterSet::new().with(FilterKind::Contrast, 201);
    assert_eq!(
        validate(Operation::filters(too_strong)),
        Err(ValidationError::IntensityOutOfRange {
            kind: FilterKind::Contrast,
            value: 201
        })
    );
}

#[test]
fn test_empty_filter_set_rejected() {
    assert_eq!(
        validate(Operation::filters(FilterSet::new())),
        Err(ValidationError::EmptyFilterSet)
    );
}

#[test]
fn test_operation_list_push_validates() {
    let mut list = OperationList::new();
    list.push(Operation::resize(640, 360)).unwrap();
    assert!(list.push(Operation::trim(4.0, 1.0)).is_err());
    assert_eq!(list.len(), 1);
}
