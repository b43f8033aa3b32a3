use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::export::ExportLogic;
use crate::export::logic::ExportScope;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Export {
        format,
        what,
        file,
        range,
        section,
        subject,
        force,
    } = cmd
    {
        let pool = DbPool::new(&cfg.database)?;
        let scope = ExportScope {
            range: range.clone(),
            section: section.clone(),
            subject: subject.clone(),
        };
        ExportLogic::export(&pool, cfg, *format, *what, file, &scope, *force)?;
    }
    Ok(())
}
