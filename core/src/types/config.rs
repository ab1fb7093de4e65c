use crate::types::{BsaFormula, EfwMethod};

/// Configuration for derived-value calculation
///
/// Passed explicitly to [`crate::recompute`]; calculators never read global
/// settings.
///
/// # Example
///
/// ```
/// use sonoreport_core::{BsaFormula, CalcConfig, EfwMethod};
///
/// let config = CalcConfig::default()
///     .with_bsa_formula(BsaFormula::DuBois)
///     .with_default_efw_method(EfwMethod::Shepard);
///
/// assert_eq!(config.bsa_formula, BsaFormula::DuBois);
/// assert_eq!(config.default_efw_method, EfwMethod::Shepard);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalcConfig {
    /// Formula used for body surface area (and everything indexed by it)
    pub bsa_formula: BsaFormula,

    /// EFW regression used when a fetus has no method selected
    pub default_efw_method: EfwMethod,
}

impl CalcConfig {
    /// Builder: Set the BSA formula
    ///
    /// # Example
    ///
    /// ```
    /// use sonoreport_core::{BsaFormula, CalcConfig};
    ///
    /// let config = CalcConfig::default().with_bsa_formula(BsaFormula::DuBois);
    /// assert_eq!(config.bsa_formula, BsaFormula::DuBois);
    /// ```
    pub fn with_bsa_formula(mut self, formula: BsaFormula) -> Self {
        self.bsa_formula = formula;
        self
    }

    /// Builder: Set the fallback EFW method
    ///
    /// # Example
    ///
    /// ```
    /// use sonoreport_core::{CalcConfig, EfwMethod};
    ///
    /// let config = CalcConfig::default().with_default_efw_method(EfwMethod::Intergrowth21);
    /// assert_eq!(config.default_efw_method, EfwMethod::Intergrowth21);
    /// ```
    pub fn with_default_efw_method(mut self, method: EfwMethod) -> Self {
        self.default_efw_method = method;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CalcConfig::default();
        assert_eq!(config.bsa_formula, BsaFormula::Mosteller);
        assert_eq!(config.default_efw_method, EfwMethod::Hadlock4);
    }

    #[test]
    fn test_builder_chain() {
        let config = CalcConfig::default()
            .with_bsa_formula(BsaFormula::DuBois)
            .with_default_efw_method(EfwMethod::Intergrowth21)
            .with_bsa_formula(BsaFormula::Mosteller);

        assert_eq!(config.bsa_formula, BsaFormula::Mosteller);
        assert_eq!(config.default_efw_method, EfwMethod::Intergrowth21);
    }
}
