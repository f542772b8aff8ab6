// Validation utilities module
// Provides custom validation functions for domain-specific rules

use validator::ValidationError;

/// Validates that a latitude is within [-90, 90] degrees
pub fn validate_latitude(latitude: f64) -> Result<(), ValidationError> {
    if !latitude.is_finite() || latitude < -90.0 || latitude > 90.0 {
        Err(ValidationError::new("latitude_out_of_range"))
    } else {
        Ok(())
    }
}

/// Validates that a longitude is within [-180, 180] degrees
pub fn validate_longitude(longitude: f64) -> Result<(), ValidationError> {
    if !longitude.is_finite() || longitude < -180.0 || longitude > 180.0 {
        Err(ValidationError::new("longitude_out_of_range"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latitude_bounds() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(90.01).is_err());
        assert!(validate_latitude(-91.0).is_err());
        assert!(validate_latitude(f64::NAN).is_err());
    }

    #[test]
    fn test_longitude_bounds() {
        assert!(validate_longitude(0.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(180.5).is_err());
        assert!(validate_longitude(f64::INFINITY).is_err());
    }
}
