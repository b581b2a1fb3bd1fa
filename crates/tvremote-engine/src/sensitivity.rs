//! Pointer sensitivity shared between the user control and the recognizer.

use tokio::sync::watch;

use crate::error::EngineError;

/// Writer side, owned by whatever drives the sensitivity control.
#[derive(Debug)]
pub struct SensitivityControl {
    tx: watch::Sender<f64>,
}

impl SensitivityControl {
    pub fn new(multiplier: f64) -> Result<Self, EngineError> {
        validate(multiplier)?;
        let (tx, _) = watch::channel(multiplier);
        Ok(Self { tx })
    }

    /// Replace the multiplier. Readers see the new value on their next read.
    pub fn set(&self, multiplier: f64) -> Result<(), EngineError> {
        validate(multiplier)?;
        self.tx.send_replace(multiplier);
        Ok(())
    }

    pub fn get(&self) -> f64 {
        *self.tx.borrow()
    }

    /// Create a reader.
    pub fn subscribe(&self) -> Sensitivity {
        Sensitivity {
            rx: self.tx.subscribe(),
        }
    }
}

/// Reader side. Always returns the current value; nothing is cached.
#[derive(Debug, Clone)]
pub struct Sensitivity {
    rx: watch::Receiver<f64>,
}

impl Sensitivity {
    pub fn multiplier(&self) -> f64 {
        *self.rx.borrow()
    }
}

fn validate(multiplier: f64) -> Result<(), EngineError> {
    if multiplier.is_finite() && multiplier > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidSensitivity(multiplier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_sees_updates_immediately() {
        let control = SensitivityControl::new(1.0).unwrap();
        let reader = control.subscribe();
        assert!((reader.multiplier() - 1.0).abs() < f64::EPSILON);

        control.set(2.0).unwrap();
        assert!((reader.multiplier() - 2.0).abs() < f64::EPSILON);
        assert!((control.get() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_values_rejected_and_value_kept() {
        let control = SensitivityControl::new(1.5).unwrap();
        assert!(control.set(0.0).is_err());
        assert!(control.set(-2.0).is_err());
        assert!(control.set(f64::NAN).is_err());
        assert!((control.get() - 1.5).abs() < f64::EPSILON);
        assert!(SensitivityControl::new(f64::INFINITY).is_err());
    }
}
