mod picker;

use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use editor_lib::{
    archive::DEFAULT_ARCHIVE_NAME,
    relay::{client::DEFAULT_SERVER, HttpRelay},
    tree::FileTree,
    Session,
};
use log::{debug, info};

/// Editor CLI options
#[derive(Parser)]
#[clap(
    version = "0.1",
    author = "Codepad Contributors",
    about = "Command line front-end of the codepad editor"
)]
pub struct EditorOpts {
    /// Relay server URL
    #[clap(short, long, env = "CODEPAD_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the file tree of a directory
    Tree { dir: PathBuf },
    /// Run a file on the relay and print its output
    Run {
        file: PathBuf,
        /// File whose content is sent as standard input
        #[clap(long)]
        stdin: Option<PathBuf>,
        /// Language to run the file as, detected from its name by default
        #[clap(short, long)]
        language: Option<String>,
    },
    /// Ask the assistant a question
    Chat { message: String },
    /// Zip every file of a directory
    Archive {
        dir: PathBuf,
        #[clap(short, long, default_value = DEFAULT_ARCHIVE_NAME)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let options = EditorOpts::parse();
    debug!("using relay at {}", options.server);

    let mut session = Session::new();
    match options.command {
        Command::Tree { dir } => {
            session.open_folder(picker::load_folder(&dir)?)?;
            print!("{}", render_tree(session.tree()));
        }
        Command::Run {
            file,
            stdin,
            language,
        } => {
            let (name, content) = picker::load_file(&file)?;
            session.open_file(&name, content);
            if let Some(language) = language {
                session.set_language(&language)?;
            }
            let stdin = match stdin {
                Some(path) => Some(picker::load_file(&path)?.1),
                None => None,
            };

            let relay = HttpRelay::new(&options.server);
            info!("Running {} as {}", name, session.editor().language);
            println!("{}", session.run(&relay, stdin.as_deref()).await);
        }
        Command::Chat { message } => {
            let relay = HttpRelay::new(&options.server);
            session.chat(&relay, &message).await?;
            if let Some(reply) = session.transcript().messages().last() {
                println!("{}", reply.content);
            }
        }
        Command::Archive { dir, output } => {
            session.open_folder(picker::load_folder(&dir)?)?;
            let file = File::create(&output)
                .with_context(|| format!("cannot create {}", output.display()))?;
            session.archive(file)?;
            info!("Wrote {}", output.display());
        }
    }

    Ok(())
}

/// Explorer view of `tree` with every folder expanded.
fn render_tree(tree: &FileTree) -> String {
    let mut tree = tree.clone();
    tree.expand_all();

    tree.visible()
        .into_iter()
        .map(|(depth, node)| {
            let suffix = if node.is_file() { "" } else { "/" };
            format!("{}{}{}\n", "  ".repeat(depth), node.name, suffix)
        })
        .collect()
}

#[cfg(test)]
mod test {
    use editor_lib::tree::UploadedFile;

    use super::*;

    #[test]
    fn test_render_tree() {
        let tree = FileTree::from_folder(vec![
            UploadedFile::new("a/x.py", ""),
            UploadedFile::new("a/b/y.js", ""),
        ])
        .unwrap();

        assert_eq!(render_tree(&tree), "a/\n  x.py\n  b/\n    y.js\n");
    }

    #[test]
    fn test_parse_run() {
        let options = EditorOpts::parse_from([
            "codepad",
            "--server",
            "http://relay:3000",
            "run",
            "main.py",
            "--language",
            "python",
        ]);

        assert_eq!(options.server, "http://relay:3000");
        match options.command {
            Command::Run { file, language, stdin } => {
                assert_eq!(file, PathBuf::from("main.py"));
                assert_eq!(language.as_deref(), Some("python"));
                assert!(stdin.is_none());
            }
            _ => panic!("expected the run command"),
        }
    }

    #[test]
    fn test_archive_default_output() {
        let options = EditorOpts::parse_from(["codepad", "archive", "proj"]);
        match options.command {
            Command::Archive { output, .. } => assert_eq!(output, PathBuf::from("project.zip")),
            _ => panic!("expected the archive command"),
        }
    }
}
