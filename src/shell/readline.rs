use std::io::{self, BufRead};

use crate::utils::config::Config;
use log::{debug, error, warn};
pub use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::Editor;
use rustyline::{CompletionType, Config as RLConfig};

/// Line source for the shell: a `rustyline` editor with history when stdin
/// is a terminal, plain buffered lines otherwise.
pub struct ReadlineManager<'a> {
    config: &'a Config,
    editor: Option<Editor<(), FileHistory>>,
}

impl<'a> ReadlineManager<'a> {
    pub fn new(config: &'a Config, interactive: bool) -> Result<Self, ReadlineError> {
        let editor = if interactive {
            let rl_config = RLConfig::builder()
                .history_ignore_space(true)
                .completion_type(CompletionType::List)
                .edit_mode(config.get_edit_mode())
                .build();
            Some(Editor::with_config(rl_config)?)
        } else {
            None
        };
        Ok(Self { config, editor })
    }

    pub fn load_history(&mut self) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        if let Err(err) = editor.load_history(&self.config.history_file) {
            warn!(
                "无法加载历史记录: {} {}",
                self.config.history_file.display(),
                err
            );
        } else {
            debug!("历史记录加载成功");
        }
    }

    /// Next line without its line terminator. End of input is reported as
    /// `ReadlineError::Eof` in both modes.
    pub fn readline(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        match self.editor.as_mut() {
            Some(editor) => editor.readline(prompt),
            None => loop {
                let mut bytes = Vec::new();
                if io::stdin().lock().read_until(b'\n', &mut bytes)? == 0 {
                    return Err(ReadlineError::Eof);
                }
                match String::from_utf8(bytes) {
                    Ok(mut line) => {
                        let len = line.trim_end_matches(['\n', '\r']).len();
                        line.truncate(len);
                        return Ok(line);
                    }
                    Err(err) => {
                        warn!("跳过非 UTF-8 输入行: {}", err);
                        eprintln!("forksh: skipping line that is not valid UTF-8");
                    }
                }
            },
        }
    }

    pub fn add_history(&mut self, line: &str) -> Result<bool, ReadlineError> {
        match self.editor.as_mut() {
            Some(editor) => editor.add_history_entry(line),
            None => Ok(false),
        }
    }

    pub fn save_history(&mut self) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        if let Err(err) = editor.save_history(&self.config.history_file) {
            error!("保存历史记录失败: {}", err);
        } else {
            debug!("历史记录保存成功");
        }
    }
}
