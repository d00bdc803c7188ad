use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use motionlab_protocol::{AnalysisMode, ResultFolder};
use motionlab_transfer::NetworkHint;

/// Upload videos for analysis and download the results.
#[derive(Parser, Debug)]
#[command(name = "motionlab", version)]
pub struct Cli {
    /// Service base URL for this invocation (overrides the config file).
    #[arg(long, global = true, value_name = "URL")]
    pub server: Option<String>,

    /// Alternate config file.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload videos for processing into a group.
    Upload(UploadArgs),
    /// Download every file of a group folder.
    Download(DownloadArgs),
    /// Download a single result file by id.
    Fetch(FetchArgs),
    /// List groups, or the folders of one group.
    Groups {
        group: Option<String>,
    },
    /// List your uploaded videos, optionally saving them.
    Videos(VideosArgs),
    /// Store an access token issued by the service.
    Login {
        #[arg(long)]
        token: String,
        #[arg(long)]
        username: Option<String>,
    },
    /// Forget the stored access token.
    Logout,
    /// Show or change the saved configuration.
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Analysis to run on the videos.
    #[arg(long)]
    pub mode: AnalysisMode,

    /// Group the results are filed under.
    #[arg(long)]
    pub group: String,

    /// Files per request.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Send the stored access token with each request.
    #[arg(long)]
    pub auth: bool,

    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    #[arg(long)]
    pub group: String,

    /// `videos` or `jsons`.
    #[arg(long)]
    pub folder: ResultFolder,

    /// Output directory.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Parallel downloads; picked from the network type when omitted.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Network type hint: slow-2g, 2g, 3g or 4g.
    #[arg(long)]
    pub network: Option<NetworkHint>,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// File id as shown by the service.
    pub id: String,

    /// Local file name; defaults to the id.
    #[arg(long)]
    pub name: Option<String>,

    /// Folder the file comes from, used to add a missing extension.
    #[arg(long)]
    pub folder: Option<ResultFolder>,

    /// Output directory.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VideosArgs {
    /// Save every listed video into this directory.
    #[arg(long, value_name = "DIR")]
    pub save: Option<PathBuf>,

    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(long)]
    pub network: Option<NetworkHint>,

    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    #[arg(long)]
    pub upload_requires_auth: Option<bool>,
}

impl ConfigArgs {
    pub fn is_empty(&self) -> bool {
        self.base_url.is_none()
            && self.batch_size.is_none()
            && self.concurrency.is_none()
            && self.network.is_none()
            && self.download_dir.is_none()
            && self.upload_requires_auth.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_upload() {
        let cli = Cli::try_parse_from([
            "motionlab", "upload", "--mode", "pose3d", "--group", "Group1", "a.mp4", "b.mp4",
        ])
        .unwrap();
        let Command::Upload(args) = cli.command else {
            panic!("expected upload");
        };
        assert_eq!(args.mode, AnalysisMode::Pose3d);
        assert_eq!(args.group, "Group1");
        assert_eq!(args.files, vec![PathBuf::from("a.mp4"), PathBuf::from("b.mp4")]);
        assert!(args.batch_size.is_none());
        assert!(!args.auth);
    }

    #[test]
    fn upload_requires_files_and_known_mode() {
        assert!(Cli::try_parse_from(["motionlab", "upload", "--mode", "pose3d", "--group", "G"]).is_err());
        assert!(
            Cli::try_parse_from(["motionlab", "upload", "--mode", "skeleton", "--group", "G", "a.mp4"])
                .is_err()
        );
    }

    #[test]
    fn parse_download_with_global_server() {
        let cli = Cli::try_parse_from([
            "motionlab", "download", "--group", "Group2", "--folder", "json", "--network", "3g",
            "--server", "http://10.0.0.2:8000",
        ])
        .unwrap();
        assert_eq!(cli.server.as_deref(), Some("http://10.0.0.2:8000"));
        let Command::Download(args) = cli.command else {
            panic!("expected download");
        };
        assert_eq!(args.folder, ResultFolder::Jsons);
        assert_eq!(args.network, Some(NetworkHint::ThreeG));
        assert!(args.concurrency.is_none());
    }

    #[test]
    fn parse_fetch() {
        let cli = Cli::try_parse_from([
            "motionlab", "fetch", "f-42", "--name", "keypoints.json", "--out", "/tmp/res",
        ])
        .unwrap();
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.id, "f-42");
        assert_eq!(args.name.as_deref(), Some("keypoints.json"));
        assert_eq!(args.out, Some(PathBuf::from("/tmp/res")));
        assert!(args.folder.is_none());

        let cli = Cli::try_parse_from(["motionlab", "fetch", "f-43", "--folder", "videos"]).unwrap();
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.folder, Some(ResultFolder::Videos));
        assert!(args.name.is_none());

        assert!(Cli::try_parse_from(["motionlab", "fetch"]).is_err());
    }

    #[test]
    fn parse_login() {
        let cli = Cli::try_parse_from(["motionlab", "login", "--token", "abc", "--username", "ana"])
            .unwrap();
        match cli.command {
            Command::Login { token, username } => {
                assert_eq!(token, "abc");
                assert_eq!(username.as_deref(), Some("ana"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_args_emptiness() {
        let cli = Cli::try_parse_from(["motionlab", "config"]).unwrap();
        let Command::Config(args) = cli.command else {
            panic!("expected config");
        };
        assert!(args.is_empty());

        let cli = Cli::try_parse_from(["motionlab", "config", "--upload-requires-auth", "true"])
            .unwrap();
        let Command::Config(args) = cli.command else {
            panic!("expected config");
        };
        assert_eq!(args.upload_requires_auth, Some(true));
        assert!(!args.is_empty());
    }
}
