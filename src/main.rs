use notewell::kernel::preview::{gallery, RenderPass};
use notewell::kernel::services::adapters::{
    AsyncRuntime, JsonConfigStore, LocalFileProvider, MemoryConfigStore,
};
use notewell::kernel::services::ports::{ConfigStore, FileProvider, Settings};
use notewell::kernel::{OpenMode, Session};
use notewell::models::{BlockStatus, EncodedImage, RenderBlock};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

mod logging;

const USAGE: &str = "usage: notewell [WORKSPACE] [--render FILE] [--gallery DIR]";
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    workspace: Option<PathBuf>,
    render: Option<PathBuf>,
    gallery: Option<PathBuf>,
}

fn absolute(cwd: &Path, arg: &str) -> PathBuf {
    let path = Path::new(arg);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Parses arguments, resolving paths against `cwd`. The workspace must be
/// an existing directory; `--render` and `--gallery` are checked when used.
fn resolve_cli_args<I>(cwd: &Path, args: I) -> io::Result<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let invalid = |msg: String| io::Error::new(io::ErrorKind::InvalidInput, msg);
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--render" | "--gallery" => {
                let value = args
                    .next()
                    .ok_or_else(|| invalid(format!("{arg} needs a path")))?;
                let path = absolute(cwd, &value);
                if arg == "--render" {
                    parsed.render = Some(path);
                } else {
                    parsed.gallery = Some(path);
                }
            }
            flag if flag.starts_with("--") => {
                return Err(invalid(format!("unknown option {flag}")));
            }
            _ if parsed.workspace.is_some() => {
                return Err(invalid(format!("unexpected argument {arg}")));
            }
            _ => {
                let path = absolute(cwd, &arg);
                let meta = std::fs::metadata(&path)?;
                if !meta.is_dir() {
                    return Err(invalid(format!("{} is not a directory", path.display())));
                }
                parsed.workspace = Some(path);
            }
        }
    }
    Ok(parsed)
}

fn config_store() -> Box<dyn ConfigStore> {
    match JsonConfigStore::user_default() {
        Some(store) => Box::new(store),
        None => {
            tracing::warn!("no settings directory, settings will not persist");
            Box::new(MemoryConfigStore::new(Settings::default()))
        }
    }
}

fn print_rows(session: &Session) {
    for row in session.workspace().rows() {
        let marker = if row.is_dir { "/" } else { "" };
        println!("{}{}{}", "  ".repeat(row.depth as usize), row.name, marker);
    }
}

fn print_image(alt: &str, status: &BlockStatus<EncodedImage>) {
    match status {
        BlockStatus::Ready(encoded) => {
            let head: String = encoded.chars().take(40).collect();
            println!("[image {alt}: {head}...]");
        }
        BlockStatus::Failed(failure) => {
            println!("[broken image {}: {}]", failure.fallback, failure.kind)
        }
        BlockStatus::Pending => println!("[image pending]"),
    }
}

fn print_pass(pass: &RenderPass) {
    for block in &pass.blocks {
        match block {
            RenderBlock::Text { markdown, images } => {
                println!("{}", markdown.trim_end());
                for image in images {
                    print!("  ");
                    print_image(&image.alt, &image.status);
                }
            }
            RenderBlock::CodeBlock { language, raw } => {
                println!("```{}\n{}```", language.as_deref().unwrap_or(""), raw)
            }
            RenderBlock::DiagramBlock { status, .. } => match status {
                BlockStatus::Ready(graphic) => {
                    println!("[diagram {}x{}]", graphic.width, graphic.height)
                }
                BlockStatus::Failed(failure) => println!("[invalid diagram: {}]", failure.reason),
                BlockStatus::Pending => println!("[diagram pending]"),
            },
            RenderBlock::ImageBlock { alt, status, .. } => print_image(alt, status),
        }
        println!();
    }
}

fn render_file(runtime: &AsyncRuntime, session: &mut Session, file: &Path) -> bool {
    if let Err(err) =
        runtime.block_on(session.document_mut().open(file, OpenMode::DiscardChanges))
    {
        eprintln!("Failed to open {}: {err}", file.display());
        return false;
    }
    session.render_document();

    // Poll inside the runtime so a current-thread fallback still makes progress.
    let settled = runtime.block_on(async {
        let deadline = tokio::time::Instant::now() + SETTLE_TIMEOUT;
        loop {
            session.preview_mut().pump();
            if session.preview().current().map_or(true, RenderPass::is_settled) {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    });
    if !settled {
        tracing::warn!(file = %file.display(), "preview did not settle in time");
    }
    if let Some(pass) = session.preview().current() {
        print_pass(pass);
    }
    true
}

fn show_gallery(
    runtime: &AsyncRuntime,
    session: &Session,
    provider: Arc<dyn FileProvider>,
    dir: &Path,
) -> bool {
    match runtime.block_on(gallery(provider, Arc::clone(session.assets()), dir)) {
        Ok(items) if items.is_empty() => {
            println!("No images found in this folder.");
            true
        }
        Ok(items) => {
            for item in items {
                match item.status {
                    BlockStatus::Ready(encoded) => println!("{} ({} chars)", item.name, encoded.len()),
                    BlockStatus::Failed(failure) => println!("{} (failed: {})", item.name, failure.kind),
                    BlockStatus::Pending => println!("{} (pending)", item.name),
                }
            }
            true
        }
        Err(err) => {
            eprintln!("Failed to load gallery: {err}");
            false
        }
    }
}

fn main() -> ExitCode {
    let _logging = logging::init();

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(err) => {
            eprintln!("notewell: {err}");
            return ExitCode::FAILURE;
        }
    };
    let args = match resolve_cli_args(&cwd, std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("notewell: {err}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let runtime = match AsyncRuntime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(error = %err, "failed to start async runtime");
            eprintln!("notewell: {err}");
            return ExitCode::FAILURE;
        }
    };

    let provider: Arc<dyn FileProvider> = Arc::new(LocalFileProvider::new());
    let mut session = Session::new(
        Arc::clone(&provider),
        config_store(),
        Arc::new(runtime.executor()),
    );

    let root = match args.workspace {
        Some(path) => Some(session.open_workspace(path)),
        None => session.restore_last_workspace(),
    };
    let mut ok = true;
    match root {
        Some(root) => {
            println!("{}", root.path.display());
            if let Err(err) = runtime.block_on(session.workspace().expand(root.id)) {
                eprintln!("{}", err.notification("open folder"));
                ok = false;
            }
            print_rows(&session);
        }
        None => println!("No workspace open."),
    }

    if let Some(file) = &args.render {
        ok &= render_file(&runtime, &mut session, file);
    }
    if let Some(dir) = &args.gallery {
        ok &= show_gallery(&runtime, &session, Arc::clone(&provider), dir);
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
#[path = "../tests/unit/cli_startup_paths.rs"]
mod tests;
