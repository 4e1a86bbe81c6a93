use std::fmt;

use log::{debug, error};
use nix::errno::Errno;
use nix::sys::wait::{wait, waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::shell::executor::status_code;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Done(i32),
    Killed(i32),
}

#[derive(Debug, Clone)]
pub struct Job {
    pub pid: Pid,
    pub index: usize,
    pub command: String,
    pub status: JobStatus,
}

impl Job {
    fn new(pid: Pid, index: usize, command: String) -> Self {
        Self {
            pid,
            index,
            command,
            status: JobStatus::Running,
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status {
            JobStatus::Running => "running".to_string(),
            JobStatus::Done(0) => "done".to_string(),
            JobStatus::Done(code) => format!("exit {}", code),
            JobStatus::Killed(code) => format!("killed ({})", code - 128),
        };
        write!(
            f,
            "[{}] {} {} {}",
            self.index, self.pid, status, self.command
        )
    }
}

/// Background children started by the shell itself. The executor never
/// registers anything here; only top-level `&` commands are tracked.
pub struct JobManager {
    jobs: Vec<Job>,
}

impl JobManager {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    pub fn get_jobs(&self) -> &[Job] {
        &self.jobs
    }

    fn find_available_index(&self) -> usize {
        let mut index = 1;
        while self.jobs.iter().any(|job| job.index == index) {
            index += 1;
        }
        index
    }

    pub fn add_job(&mut self, pid: Pid, command: String) -> &Job {
        let index = self.find_available_index();
        debug!("后台任务 [{}] {}: {}", index, pid, command);
        self.jobs.push(Job::new(pid, index, command));
        &self.jobs[self.jobs.len() - 1]
    }

    /// Removes the job for `pid` and returns it with its final status.
    pub fn mark_finished(&mut self, pid: Pid, code: i32, signaled: bool) -> Option<Job> {
        let pos = self.jobs.iter().position(|job| job.pid == pid)?;
        let mut job = self.jobs.remove(pos);
        job.status = if signaled {
            JobStatus::Killed(code)
        } else {
            JobStatus::Done(code)
        };
        Some(job)
    }

    /// Collects finished children without blocking.
    pub fn reap(&mut self) -> Vec<Job> {
        let mut finished = Vec::new();
        loop {
            match waitpid(None::<Pid>, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
                Ok(status) => finished.extend(self.record(status)),
                Err(Errno::EINTR) => continue,
                Err(err) => {
                    error!("waitpid 失败: {}", err);
                    break;
                }
            }
        }
        finished
    }

    /// Blocks until every child of the shell has terminated. Running out of
    /// children (`ECHILD`) is the normal way out.
    pub fn wait_all(&mut self) -> Vec<Job> {
        let mut finished = Vec::new();
        loop {
            match wait() {
                Ok(status) => finished.extend(self.record(status)),
                Err(Errno::ECHILD) => break,
                Err(Errno::EINTR) => continue,
                Err(err) => {
                    error!("wait 失败: {}", err);
                    break;
                }
            }
        }
        finished
    }

    fn record(&mut self, status: WaitStatus) -> Option<Job> {
        let pid = status.pid()?;
        let code = status_code(status)?;
        let signaled = matches!(status, WaitStatus::Signaled(..));
        let job = self.mark_finished(pid, code, signaled);
        if job.is_none() {
            debug!("回收未登记的子进程 {} ({})", pid, code);
        }
        job
    }
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new()
    }
}
