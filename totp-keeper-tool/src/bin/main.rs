use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use totp_keeper::maintenance::{self, Confirm};
use totp_keeper::{Config, REGION_SIZE};
use totp_keeper_tool::{
    Error, ImageFile, capacity_from_count, code_for_slot, completed, secret_from_uri,
};

#[derive(Parser)]
#[command(name = "totp-keeper-tool")]
#[command(about = "Formats and edits totp-keeper EEPROM images", long_about = None)]
struct Cli {
    /// Number of account slots of the layout (4 or 15)
    #[arg(long, global = true, default_value_t = 4)]
    slots: u8,

    /// Answer every confirmation with yes
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the header and zero all records, creating the image if needed
    Format {
        /// EEPROM image file path
        image: PathBuf,
    },
    /// Store an account from an otpauth://totp/ URI
    Add {
        image: PathBuf,
        slot: u8,
        /// Up to 8 bytes of UTF-8
        label: String,
        /// otpauth://totp/...?secret=... URI
        uri: String,
    },
    /// Clear a slot
    Erase { image: PathBuf, slot: u8 },
    /// Duplicate an account into another slot
    Copy {
        image: PathBuf,
        src: u8,
        dst: u8,
    },
    /// Print every slot with its label
    List { image: PathBuf },
    /// Print the code a slot shows
    Code {
        image: PathBuf,
        slot: u8,
        /// Unix time in seconds, defaults to now
        #[arg(short, long)]
        time: Option<u64>,
    },
}

/// Asks on stdin unless `--yes` was given.
struct Prompt {
    assume_yes: bool,
}

impl Confirm for Prompt {
    fn confirm(&mut self, question: &str) -> bool {
        if self.assume_yes {
            println!("{question} (y/n): y");
            return true;
        }
        print!("{question} (y/n): ");
        let _ = io::stdout().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        answer.trim().eq_ignore_ascii_case("y")
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let capacity = capacity_from_count(cli.slots)?;
    let mut prompt = Prompt {
        assume_yes: cli.yes,
    };

    match cli.command {
        Commands::Format { image } => {
            let mut file = ImageFile::open_or_blank(&image, capacity)?;
            completed(maintenance::format(file.store(), &mut prompt)?)?;
            file.save()?;
            println!("Formatted {} ({REGION_SIZE} bytes)", image.display());
        }
        Commands::Add {
            image,
            slot,
            label,
            uri,
        } => {
            let secret = secret_from_uri(&uri)?;
            let mut file = ImageFile::open(&image, capacity)?;
            completed(maintenance::add_account(
                file.store(),
                slot,
                &label,
                &secret,
                &mut prompt,
            )?)?;
            file.save()?;
            println!("Record added to slot {slot}.");
        }
        Commands::Erase { image, slot } => {
            let mut file = ImageFile::open(&image, capacity)?;
            maintenance::erase_account(file.store(), slot)?;
            file.save()?;
            println!("Slot {slot} has been erased.");
        }
        Commands::Copy { image, src, dst } => {
            let mut file = ImageFile::open(&image, capacity)?;
            completed(maintenance::copy_account(file.store(), src, dst, &mut prompt)?)?;
            file.save()?;
            println!("Account copied from slot {src} to slot {dst}.");
        }
        Commands::List { image } => {
            let mut file = ImageFile::open(&image, capacity)?;
            for summary in maintenance::list_accounts(file.store())? {
                println!("{summary}");
            }
        }
        Commands::Code { image, slot, time } => {
            let unix_time = match time {
                Some(time) => time,
                None => SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs(),
            };
            let mut file = ImageFile::open(&image, capacity)?;
            let config = Config::default().with_capacity(capacity);
            let (label, code) = code_for_slot(file.store(), slot, unix_time, &config)?;
            println!("{slot} {label}: {code}");
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match run(cli) {
        Err(e) if matches!(e.downcast_ref::<Error>(), Some(Error::Canceled)) => {
            println!("Operation canceled.");
            Ok(())
        }
        result => result,
    }
}
