mod board;
mod command;
mod session;

use std::io::{self, BufRead, Write};

use pms_core::config::PmsConfig;
use session::{Reply, Session, Shared};

fn main() -> io::Result<()> {
    let config = PmsConfig::DEFAULT;
    let shared = Shared::new(&config);
    let mut session = Session::new(config, &shared);

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut line = String::new();

    writeln!(
        writer,
        "PMS bench emulator ready. Type `help` for commands or `exit` to quit."
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match session.handle_line(trimmed) {
            Reply::Exit => {
                writeln!(writer, "Session closed.")?;
                break;
            }
            Reply::Lines(lines) => {
                for response in lines {
                    writeln!(writer, "{response}")?;
                }
            }
        }
    }

    Ok(())
}
