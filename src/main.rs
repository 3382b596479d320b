use clap::{Parser, Subcommand};
use prompt_reader::{config, output, prompt, session::Session};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "prompt-reader")]
#[command(about = "Read and edit generation parameters embedded in PNG/JPEG images")]
#[command(long_about = "\
Read and edit generation parameters embedded in PNG/JPEG images

Generators store the prompt and settings as text inside the image:

  PNG   tEXt/iTXt chunk (usually keyed \"parameters\")
  JPEG  EXIF UserComment

The text follows this layout:

  a lighthouse on a cliff, stormy sea
  Negative prompt: blurry, lowres
  Steps: 30, Sampler: Euler a, CFG scale: 7

Edited parameters can only be written back into PNG files. The result is
saved next to the original as <name>_edit.png unless --out is given.

Run 'prompt-reader gen-config' to generate a documented prompt-reader.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./prompt-reader.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the prompt, negative prompt and parameters of an image
    Show {
        file: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
        /// Print only the positive prompt
        #[arg(long, conflicts_with = "json")]
        prompt_only: bool,
        /// Explain why no annotation was found
        #[arg(long)]
        verbose: bool,
    },
    /// Print the embedded annotation text exactly as stored
    Raw { file: PathBuf },
    /// Edit the annotation and save a new PNG
    Edit(EditArgs),
    /// Print a stock prompt-reader.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct EditArgs {
    file: PathBuf,
    /// Replace the positive prompt
    #[arg(long)]
    prompt: Option<String>,
    /// Replace the negative prompt
    #[arg(long)]
    negative: Option<String>,
    /// Set a parameter, e.g. --param "CFG scale=7" (repeatable)
    #[arg(long = "param", value_parser = parse_key_value)]
    params: Vec<(String, String)>,
    /// Remove a parameter by key (repeatable)
    #[arg(long = "remove-param")]
    remove: Vec<String>,
    /// Output path (default: <name>_edit.png next to the input)
    #[arg(long)]
    out: Option<PathBuf>,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    prompt::check_param(key, value).map_err(|e| e.to_string())?;
    Ok((key.trim().to_string(), value.to_string()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = config::discover_config(cli.config.as_deref(), Path::new("."))?;
    let mut session = Session::new(config.save.clone());

    match cli.command {
        Command::Show {
            file,
            json,
            prompt_only,
            verbose,
        } => {
            let image = session.load_path(&file)?;
            if json {
                println!("{}", output::format_show_json(image)?);
            } else if prompt_only {
                if image.parsed.prompt.is_empty() {
                    println!("{}", config.not_found_text);
                } else {
                    println!("{}", image.parsed.prompt);
                }
            } else {
                output::print_show_output(image, &config.not_found_text, verbose);
            }
        }
        Command::Raw { file } => {
            let image = session.load_path(&file)?;
            match &image.raw {
                Some(raw) => println!("{raw}"),
                None => println!("{}", config.not_found_text),
            }
        }
        Command::Edit(args) => {
            output::print_stage("Reading", &args.file);
            session.load_path(&args.file)?;
            if let Some(prompt) = session.prompt_mut() {
                if let Some(text) = args.prompt {
                    prompt.prompt = text;
                }
                if let Some(text) = args.negative {
                    prompt.negative = text;
                }
                for (key, value) in &args.params {
                    prompt.set_param(key, value)?;
                }
                for key in &args.remove {
                    prompt.remove_param(key);
                }
            }
            if let Some(saved) = session.save()? {
                let path = match args.out {
                    Some(out) => {
                        std::fs::write(&out, &saved.bytes)?;
                        out
                    }
                    None => {
                        let dir = args.file.parent().unwrap_or(Path::new("."));
                        saved.write_to_dir(dir)?
                    }
                };
                output::print_saved(&path, saved.bytes.len());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
