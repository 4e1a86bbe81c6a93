use std::env;
use std::io;

use log::debug;

/// Lines the shell handles itself instead of parsing them. Recognition is a
/// plain prefix test on the raw line; these never combine with `|`, `;` etc.
#[derive(Debug, PartialEq, Eq)]
pub enum Builtin<'a> {
    Cd(&'a str),
    Wait,
    Exit,
}

impl<'a> Builtin<'a> {
    pub fn recognize(line: &'a str) -> Option<Self> {
        let line = line.trim_start();
        if let Some(target) = line.strip_prefix("cd ") {
            return Some(Builtin::Cd(target.trim()));
        }
        match line.trim_end() {
            "cd" => Some(Builtin::Cd("")),
            "wait" => Some(Builtin::Wait),
            "exit" => Some(Builtin::Exit),
            _ => None,
        }
    }
}

pub fn change_dir(target: &str) -> io::Result<()> {
    let target = if target.is_empty() { "~" } else { target };
    let path = shellexpand::tilde(target);
    debug!("cd {}", path);
    env::set_current_dir(&*path)
}
