use clap::{Parser, Subcommand};

mod diagnostics;
mod fragment;
mod matrix;
mod render;
mod resolve;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "cigen")]
#[command(about = "CI job matrix generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a CI configuration (validates the matrix while running).
    Generate {
        #[arg(long)]
        matrix: String,

        /// Output path, or "-" for stdout.
        #[arg(short = 'o', long)]
        out: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Generate { matrix, out } => {
            // 1) Parse + validate matrix.json (property table + jobs + cache).
            let spec: matrix::MatrixSpec =
                serde_json::from_str(&std::fs::read_to_string(&matrix)?)?;
            let validated = spec.validate_and_build()?;

            // 2) Resolve each job against the property table.
            let resolved = resolve::resolve_jobs(&validated)?;

            // 3) Order: stage count descending, then priority ascending.
            let ordered = resolve::order(resolved)?;

            // 4) Render and write the document.
            let text = render::render_config(&ordered, &validated.cache)?;
            if out == "-" {
                print!("{}", text);
            } else {
                std::fs::write(&out, text)?;
                println!("Wrote {}", out);
            }
        }
    }

    Ok(())
}
