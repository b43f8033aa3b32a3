use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::log::LogLogic;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::info;

/// `log --print`: dump the internal audit table (taps, conversions,
/// directory edits, migrations).
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Log { print } = cmd else {
        return Ok(());
    };

    if !*print {
        info("Nothing to show: use `rollcall log --print`.");
        return Ok(());
    }

    let pool = DbPool::new(&cfg.database)?;
    LogLogic::print_log(&pool)
}
