use clap::Parser;
use miette::Result;
use sst::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    // This is standard practice for CLI tools that output to stdout.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => sst::cli::commands::init::run(args, &global),
        Commands::Ingest(args) => sst::cli::commands::ingest::run(args, &global),
        Commands::Search(args) => sst::cli::commands::search::run(args, &global),
        Commands::Part(cmd) => sst::cli::commands::part::run(cmd, &global),
        Commands::Map(cmd) => sst::cli::commands::map::run(cmd, &global),
        Commands::Compare(args) => sst::cli::commands::compare::run(args, &global),
        Commands::Credit(args) => sst::cli::commands::credit::run(args, &global),
        Commands::Selection(cmd) => sst::cli::commands::selection::run(cmd, &global),
        Commands::Config(cmd) => sst::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => sst::cli::commands::completions::run(args),
    }
}
