use crate::{models::Parameters, Context};

use super::Strategy;

/// Always active. Constraints still apply.
pub struct DefaultStrategy;

impl Strategy for DefaultStrategy {
    fn name(&self) -> &str {
        "default"
    }

    fn is_enabled(&self, _parameters: &Parameters, _context: &Context) -> bool {
        true
    }
}
