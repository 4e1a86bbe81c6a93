use log::{debug, error, info, warn};
use std::error::Error;
use std::io::Write;

use crate::shell::commands::{change_dir, Builtin};
use crate::shell::executor::{spawn, wait_child, ExecError};
use crate::shell::job_manager::{Job, JobManager};
use crate::shell::parser::{parse, Command};
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::shell::signals;
use crate::utils::config::Config;
use crate::utils::theme::Theme;

/// Status of a line that failed to parse.
pub const PARSE_ERROR_STATUS: i32 = 2;

enum Flow {
    Continue,
    Exit,
}

pub struct Shell<'a> {
    config: &'a Config,
    theme: Theme,
    readline: ReadlineManager<'a>,
    jobs: JobManager,
    interactive: bool,
    last_status: i32,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config, theme: Theme, interactive: bool) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            config,
            theme,
            readline: ReadlineManager::new(config, interactive)?,
            jobs: JobManager::new(),
            interactive,
            last_status: 0,
        })
    }

    /// Reads and runs lines until end of input or `exit`. Returns the status
    /// of the last line that ran.
    pub fn run(&mut self) -> Result<i32, Box<dyn Error>> {
        debug!("初始化 forksh (interactive: {})...", self.interactive);

        if self.interactive {
            // 忽略 Ctrl-C / Ctrl-\，子进程会恢复默认处理
            signals::ignore_interactive_signals();
            self.readline.load_history();
            if !self.theme.welcome_message.is_empty() {
                println!("{}", self.theme.welcome_message);
            }
        }

        self.run_loop()?;
        self.readline.save_history();

        let running = self.jobs.get_jobs().len();
        if running > 0 {
            warn!("退出时仍有 {} 个后台任务", running);
            if self.interactive {
                eprintln!(
                    "{}",
                    (self.theme.warning_style)(format!("{} background job(s) still running", running))
                );
            }
        }

        debug!("退出 forksh, 状态 {}", self.last_status);
        Ok(self.last_status)
    }

    /// Runs a single line the way `-c` does.
    pub fn run_line(&mut self, line: &str) -> i32 {
        self.handle_input(line);
        self.last_status
    }

    fn run_loop(&mut self) -> Result<(), Box<dyn Error>> {
        loop {
            self.report_finished(false);
            std::io::stdout().flush()?;
            let prompt = if self.interactive {
                self.theme.prompt.clone()
            } else {
                String::new()
            };

            match self.readline.readline(&prompt) {
                Ok(line) => {
                    if let Flow::Exit = self.handle_input(&line) {
                        if self.interactive && !self.theme.exit_message.is_empty() {
                            println!("{}", self.theme.exit_message);
                        }
                        break;
                    }
                }
                Err(ReadlineError::Eof) => {
                    debug!("接收到 EOF，退出 forksh...");
                    break;
                }
                Err(ReadlineError::Interrupted) => {
                    warn!("接收到中断信号...");
                }
                Err(err) => {
                    error!("发生错误: {}", err);
                    eprintln!("{}: {}", (self.theme.error_style)("forksh".to_string()), err);
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }

    fn handle_input(&mut self, line: &str) -> Flow {
        if line.trim().is_empty() {
            return Flow::Continue;
        }
        if let Err(err) = self.readline.add_history(line) {
            warn!("无法写入历史记录: {}", err);
        }

        if let Some(builtin) = Builtin::recognize(line) {
            return self.run_builtin(builtin);
        }

        let command = match parse(line, self.config.max_line) {
            Ok(command) => command,
            Err(err) => {
                warn!("解析失败 {:?}: {}", line, err);
                eprintln!("forksh: {}", err);
                self.last_status = PARSE_ERROR_STATUS;
                return Flow::Continue;
            }
        };
        debug!("执行命令: {}", command);

        self.last_status = match self.dispatch(&command) {
            Ok(status) => status,
            Err(err) => {
                error!("执行失败: {}", err);
                eprintln!("forksh: {}", err);
                err.exit_code()
            }
        };
        if self.interactive && self.last_status != 0 {
            eprintln!(
                "{} {}",
                self.theme.error_symbol,
                (self.theme.error_style)(format!("exit {}", self.last_status))
            );
        }
        Flow::Continue
    }

    fn run_builtin(&mut self, builtin: Builtin<'_>) -> Flow {
        debug!("内建命令: {:?}", builtin);
        match builtin {
            Builtin::Cd(target) => {
                self.last_status = match change_dir(target) {
                    Ok(()) => 0,
                    Err(err) => {
                        eprintln!("cannot cd {}: {}", target, err);
                        1
                    }
                };
            }
            Builtin::Wait => {
                self.report_finished(true);
                self.last_status = 0;
            }
            Builtin::Exit => return Flow::Exit,
        }
        Flow::Continue
    }

    /// Forks the tree from the top. Each background sequence at the root puts
    /// its first command into its own child, tracked as a job; whatever is
    /// left runs in one foreground child whose status is returned.
    fn dispatch(&mut self, command: &Command) -> Result<i32, ExecError> {
        let mut command = command;
        while let Command::Sequence {
            first,
            rest,
            background: true,
        } = command
        {
            let pid = spawn(first)?;
            let job = self.jobs.add_job(pid, first.to_string());
            info!("后台任务 {}", job);
            if self.interactive {
                println!("[{}] {}", job.index, job.pid);
            }
            command = rest.as_ref();
        }

        if command.is_empty() {
            return Ok(0);
        }
        let pid = spawn(command)?;
        wait_child(pid)
    }

    /// Reaps background children, blocking until none are left when `block`
    /// is set, and reports those that were tracked as jobs.
    fn report_finished(&mut self, block: bool) {
        let finished: Vec<Job> = if block {
            self.jobs.wait_all()
        } else {
            self.jobs.reap()
        };
        for job in finished {
            info!("任务结束 {}", job);
            if self.interactive {
                println!("{}", job);
            }
        }
    }
}
