//! rollcall main entrypoint.

use rollcall::run;
use rollcall::ui::messages::{error, warning};

fn main() {
    if let Err(e) = run() {
        // Rejections exit with status 2.
        if e.is_rejection() {
            warning(format!("Tap rejected: {}", e));
            std::process::exit(2);
        }
        error(format!("Error: {}", e));
        std::process::exit(1);
    }
}
