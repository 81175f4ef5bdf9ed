//! tplview's main application entry point.
//! Parses the command line and dispatches to the preview session.

use std::io::{BufReader, Read};
use std::time::Duration;

use tplview::{
    cli::{get_args, Args, Command},
    error::{default_error_handler, Result},
    logger::init_logger,
    protocol::NoticeLevel,
    session::{serve, PreviewSession},
};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Reads template data from a file, or from stdin when `source` is `-`.
fn read_data(source: &str) -> Result<serde_json::Value> {
    let content = if source == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(source)?
    };
    if content.trim().is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    Ok(serde_json::from_str(&content)?)
}

/// Main application logic execution.
///
/// # Flow
/// * `list` - scans the template directories and prints one template per line
/// * `render` - registers partials and helpers, then renders one template
/// * `serve` - runs the preview protocol until stdin closes
/// * `reload-helpers` - loads the helpers file and reports the outcome
fn run(args: Args) -> Result<()> {
    let mut session = PreviewSession::new(args.workspace);

    match args.command {
        Command::List => {
            if let Err(e) = session.check_configuration() {
                log::warn!("{}", e);
            }
            for template in session.templates() {
                println!(
                    "{}\t{}\t{}",
                    template.name,
                    template.directory,
                    template.full_path.display()
                );
            }
        }
        Command::Render { name, data } => {
            if let Err(e) = session.check_configuration() {
                log::warn!("{}", e);
            }
            let data = match data {
                Some(source) => read_data(&source)?,
                None => session.template_data(&name),
            };
            let html = session.render_with_helpers(&name, data)?;
            println!("{}", html);
        }
        Command::Serve { poll_interval } => {
            let input = BufReader::new(std::io::stdin());
            serve(&mut session, input, std::io::stdout(), Duration::from_millis(poll_interval))?;
        }
        Command::ReloadHelpers => match session.helper_report()? {
            (NoticeLevel::Info, message) => println!("{}", message),
            (_, message) => eprintln!("Warning: {}", message),
        },
    }
    Ok(())
}
