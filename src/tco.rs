//! Five-year total cost of ownership arithmetic.
//!
//! Deterministic and dependency-free; the computed total becomes the numeric
//! justification fed, as free text, into the pricing recommendation prompt.

/// Cost inputs in whole currency units. Non-negative by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcoInputs {
    /// Up-front software licensing.
    pub acquisition: u64,
    /// Migration and integration services.
    pub migration: u64,
    /// Annual cloud infrastructure.
    pub annual_infra: u64,
    /// Annual maintenance and support contract.
    pub annual_support: u64,
    /// Annual personnel to run the system.
    pub annual_personnel: u64,
}

impl TcoInputs {
    /// One year of operating cost across the three annual components.
    pub fn annual_operating(&self) -> u64 {
        self.annual_infra + self.annual_support + self.annual_personnel
    }

    /// Up-front costs plus five years of operating costs.
    pub fn five_year_total(&self) -> u64 {
        self.acquisition + self.migration + 5 * self.annual_operating()
    }

    /// The cost summary line the pricing recommendation prompt consumes.
    pub fn components_summary(&self) -> String {
        format!(
            "Acquisition: €{}, Annual Ops: €{}, 5-Year TCO: €{}",
            format_amount(self.acquisition + self.migration),
            format_amount(self.annual_operating()),
            format_amount(self.five_year_total()),
        )
    }
}

/// Render a currency amount with thousands separators: 1045000 → "1,045,000".
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_inputs() -> TcoInputs {
        TcoInputs {
            acquisition: 150_000,
            migration: 45_000,
            annual_infra: 60_000,
            annual_support: 30_000,
            annual_personnel: 80_000,
        }
    }

    #[test]
    fn test_five_year_total() {
        assert_eq!(reference_inputs().five_year_total(), 1_045_000);
    }

    #[test]
    fn test_zero_inputs_give_zero_total() {
        let zero = TcoInputs {
            acquisition: 0,
            migration: 0,
            annual_infra: 0,
            annual_support: 0,
            annual_personnel: 0,
        };
        assert_eq!(zero.five_year_total(), 0);
    }

    #[test]
    fn test_components_summary() {
        assert_eq!(
            reference_inputs().components_summary(),
            "Acquisition: €195,000, Annual Ops: €170,000, 5-Year TCO: €1,045,000"
        );
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(999), "999");
        assert_eq!(format_amount(1_000), "1,000");
        assert_eq!(format_amount(1_045_000), "1,045,000");
    }
}
