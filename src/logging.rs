//! ログ初期化モジュール
//!
//! `tracing` + `tracing-subscriber` を使用して、デバッグログを外部ファイルに出力する。
//! ログファイルはプラットフォームのデータディレクトリ配下の `logs/` に、
//! ローカル日付で日次ローテーションして保存される。端末には出力しない。

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use directories::ProjectDirs;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{fmt, EnvFilter};

/// ログレベルを制御する環境変数
pub const LOG_ENV_VAR: &str = "COMMIT_BUTLER_LOG";

/// ログファイル名のプレフィックス
const LOG_PREFIX: &str = "commit-butler.log";

/// ログ行のタイムスタンプをローカル時刻で出力するタイマー
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// ローカル日付で日次ローテーションするファイルアペンダー。
///
/// 書き込み時に現在の日付を確認し、日付が変わっていれば新しいファイルを開く。
struct DailyAppender {
    dir: PathBuf,
    current_date: NaiveDate,
    file: File,
}

impl DailyAppender {
    fn new(dir: PathBuf) -> std::io::Result<Self> {
        let today = Local::now().date_naive();
        let file = open_log_file(&dir, today)?;
        Ok(Self {
            dir,
            current_date: today,
            file,
        })
    }
}

impl Write for DailyAppender {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let today = Local::now().date_naive();
        if today != self.current_date {
            self.file = open_log_file(&self.dir, today)?;
            self.current_date = today;
        }
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

/// `commit-butler.log.YYYY-MM-DD`
fn log_file_name(date: NaiveDate) -> String {
    format!("{LOG_PREFIX}.{}", date.format("%Y-%m-%d"))
}

fn open_log_file(dir: &Path, date: NaiveDate) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(log_file_name(date)))
}

/// ログの出力先ディレクトリ（`<data dir>/logs`）。
/// データディレクトリが決まらない環境ではカレントディレクトリの `logs/` を使う。
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("", "", "commit-butler")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// ログシステムを初期化する。
///
/// - ログレベルは `COMMIT_BUTLER_LOG` 環境変数で制御（デフォルト: `info`）
/// - ログファイルを開けない場合は警告を表示し、ファイルログなしで続行する
///
/// 戻り値のガードは `main()` で保持し続ける必要がある（ドロップするとログ出力が停止する）。
pub fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let dir = log_dir();

    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!(
            "commit-butler: warning: failed to create log directory {}: {e}",
            dir.display()
        );
        return None;
    }

    let appender = match DailyAppender::new(dir.clone()) {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!(
                "commit-butler: warning: failed to open log file in {}: {e}",
                dir.display()
            );
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let env_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(env_filter)
        .with_writer(non_blocking)
        .with_timer(LocalTimer)
        .with_ansi(false) // ファイル出力には ANSI カラーコードを含めない
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_file(true)
        .init();

    Some(guard)
}
