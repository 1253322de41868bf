use dutycal_core::models::DutyCycle;

use super::Context;
use crate::error::CliResult;

#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    pub latest: Option<DutyCycle>,
    pub current: Option<DutyCycle>,
    pub total: usize,
}

/// The last scheduled cycle and the one covering today.
pub fn status(ctx: &Context) -> CliResult<StatusReport> {
    let history = ctx.store.load_history()?;
    Ok(StatusReport {
        latest: history.latest(),
        current: history.covering(ctx.today),
        total: history.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures::context;
    use crate::commands::update;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    #[test]
    fn reports_current_and_latest() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path());
        assert_eq!(status(&ctx).unwrap().total, 0);

        update(&ctx, 3, &mut StdRng::seed_from_u64(1)).unwrap();
        let report = status(&ctx).unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.current.unwrap().start_date.to_string(), "2024-01-01");
        assert_eq!(report.latest.unwrap().start_date.to_string(), "2024-01-15");
    }
}
