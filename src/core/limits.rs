//! Specification, control and action limits for one chart

/// Optional upper/lower action limits shown alongside the other limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionLimits {
    pub ual: f64,
    pub lal: f64,
}

/// Limits read from the current week's source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    /// Upper specification limit
    pub usl: f64,
    /// Lower specification limit
    pub lsl: f64,
    /// Upper control limit
    pub ucl: f64,
    /// Lower control limit
    pub lcl: f64,
    pub action: Option<ActionLimits>,
}

impl Limits {
    /// Swap inverted pairs so that `lsl <= usl` and `lcl <= ucl`
    pub fn normalized(self) -> Self {
        Self {
            usl: self.usl.max(self.lsl),
            lsl: self.usl.min(self.lsl),
            ucl: self.ucl.max(self.lcl),
            lcl: self.ucl.min(self.lcl),
            action: self.action,
        }
    }

    /// Width of the specification band
    pub fn spec_width(&self) -> f64 {
        self.usl - self.lsl
    }
}
