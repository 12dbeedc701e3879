use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use photo_organizer_core::{
    app_paths, load_config, organize, save_config, AppConfig, ExifReader, ExiftoolReader,
    MetadataReader, OrganizeOptions, OrganizePlan, ReaderKind,
};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "photo-organizer-cli")]
#[command(about = "写真・動画を撮影日時ごとのフォルダへ重複チェック付きで整理します")]
struct Cli {
    /// 詳細ログを出力する
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Organize(OrganizeArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    Init,
}

#[derive(Debug, Args)]
struct OrganizeArgs {
    /// 整理対象のフォルダ (複数可)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    #[arg(long, short = 'o')]
    output_root: PathBuf,
    #[arg(long)]
    extra_dir: Option<String>,
    #[arg(long)]
    extra_suffix: Option<String>,
    /// 日時が取れないファイルに付ける接頭辞。未指定ならそのファイルはスキップ
    #[arg(long)]
    no_exif_prefix: Option<String>,
    #[arg(long)]
    zero_pad: Option<usize>,
    #[arg(long, default_value_t = false)]
    use_filename_for_timestamp: bool,
    #[arg(long, default_value_t = false)]
    check_file_modify_date: bool,
    #[arg(long, short = 'n', default_value_t = false)]
    dry_run: bool,
    #[arg(long, value_enum)]
    reader: Option<ReaderArg>,
    /// exiftool実行ファイルのパス
    #[arg(long)]
    exiftool: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReaderArg {
    Exiftool,
    Builtin,
}

impl From<ReaderArg> for ReaderKind {
    fn from(value: ReaderArg) -> Self {
        match value {
            ReaderArg::Exiftool => ReaderKind::Exiftool,
            ReaderArg::Builtin => ReaderKind::Builtin,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug)?;

    match cli.command {
        Commands::Organize(args) => cmd_organize(args),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Init => cmd_config_init(),
        },
    }
}

fn init_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("ログ出力を初期化できませんでした: {err}"))
}

fn cmd_organize(args: OrganizeArgs) -> Result<()> {
    let config = load_config()?;
    debug!(?config, "設定を読み込みました");
    let tables = config.lookup_tables();

    let options = OrganizeOptions {
        inputs: args.inputs,
        output_root: args.output_root,
        extra_dir: args.extra_dir,
        extra_suffix: args.extra_suffix,
        no_exif_prefix: args.no_exif_prefix.or(config.no_exif_prefix.clone()),
        zero_pad: args.zero_pad.unwrap_or(config.zero_pad),
        use_filename_for_timestamp: args.use_filename_for_timestamp
            || config.use_filename_for_timestamp,
        check_file_modify_date: args.check_file_modify_date || config.check_file_modify_date,
        dry_run: args.dry_run,
    };

    let reader_kind = args.reader.map(ReaderKind::from).unwrap_or(config.reader);
    let reader: Box<dyn MetadataReader> = match reader_kind {
        ReaderKind::Exiftool => Box::new(
            args.exiftool
                .map(ExiftoolReader::with_program)
                .unwrap_or_default(),
        ),
        ReaderKind::Builtin => Box::new(ExifReader),
    };

    let report = organize(&options, &tables, reader.as_ref())?;

    if options.dry_run {
        match args.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report.plan)?),
            OutputFormat::Table => print_table(&report.plan),
        }
    }
    print_summary(&report.plan);

    match report.applied {
        Some(result) => eprintln!("移動完了: {}件", result.moved),
        None => eprintln!("dry-runモード: 実ファイルは変更していません。"),
    }
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("設定ファイル: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let paths = app_paths()?;
    if paths.config_path.exists() {
        anyhow::bail!(
            "設定ファイルは既に存在します: {}",
            paths.config_path.display()
        );
    }
    let path = save_config(&AppConfig::default())?;
    println!("設定ファイルを作成しました: {}", path.display());
    Ok(())
}

fn print_table(plan: &OrganizePlan) {
    print!("{}", format_table(plan));
}

/// One `source -> destination` line per planned move.
fn format_table(plan: &OrganizePlan) -> String {
    plan.moves
        .iter()
        .map(|planned| {
            format!(
                "{} -> {}\n",
                planned.source.display(),
                planned.target_path().display()
            )
        })
        .collect()
}

fn print_summary(plan: &OrganizePlan) {
    let stats = &plan.stats;
    eprintln!(
        "集計: scanned={} recognized={} unknown_type_skip={} no_timestamp_skip={} timestamped={} ordinal={} planned={}",
        stats.scanned_files,
        stats.recognized,
        stats.skipped_unknown_type,
        stats.skipped_no_timestamp,
        stats.timestamped,
        stats.ordinal_named,
        stats.planned
    );
}
