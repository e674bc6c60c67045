//! Report delivery.
//!
//! Mail goes through a local MTA command (`sendmail -t` or anything that
//! reads a message with headers on stdin). Failures are returned to the
//! caller, which logs them; they never abort a run.

use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::MailConfig;
use crate::error::{Error, Result};

pub trait Notifier {
    fn send(&self, subject: &str, body: &str) -> Result<()>;
}

/// Pipes an RFC 822 style message into a mail command.
pub struct CommandNotifier {
    mail: MailConfig,
    timeout: Duration,
}

impl CommandNotifier {
    pub fn new(mail: MailConfig) -> Self {
        CommandNotifier {
            mail,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn message(&self, subject: &str, body: &str) -> String {
        format!(
            "From: {}\nTo: {}\nSubject: {subject}\nMIME-Version: 1.0\nContent-Type: text/plain; charset=UTF-8\n\n{body}",
            self.mail.from, self.mail.to
        )
    }
}

impl Notifier for CommandNotifier {
    fn send(&self, subject: &str, body: &str) -> Result<()> {
        let (program, args) = self
            .mail
            .command
            .split_first()
            .ok_or_else(|| Error::Notification("no mail command configured".to_string()))?;

        debug!(program = %program, "sending notification");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Notification(format!("failed to spawn {program}: {e}")))?;

        let start = Instant::now();

        // a command that never reads would block a large write forever,
        // so the write runs beside the timeout loop and the pipe closes when it ends
        let mut writer = child.stdin.take().map(|mut stdin| {
            let message = self.message(subject, body).into_bytes();
            thread::spawn(move || stdin.write_all(&message))
        });

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    if !status.success() {
                        let mut stderr = String::new();
                        if let Some(mut pipe) = child.stderr.take() {
                            let _ = pipe.read_to_string(&mut stderr);
                        }
                        return Err(Error::Notification(format!(
                            "{program} failed with status {}: {}",
                            status.code().unwrap_or(-1),
                            stderr.trim()
                        )));
                    }
                    if let Some(writer) = writer.take() {
                        match writer.join() {
                            Ok(Ok(())) => {}
                            Ok(Err(e)) => {
                                return Err(Error::Notification(format!(
                                    "failed to write message to {program}: {e}"
                                )))
                            }
                            Err(_) => {
                                return Err(Error::Notification(format!(
                                    "message writer for {program} panicked"
                                )))
                            }
                        }
                    }
                    info!(to = %self.mail.to, "notification sent");
                    return Ok(());
                }
                Ok(None) => {
                    if start.elapsed() > self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(Error::Notification(format!(
                            "{program} timed out after {}",
                            humantime::format_duration(self.timeout)
                        )));
                    }
                    thread::sleep(Duration::from_millis(50));
                }
                Err(e) => {
                    return Err(Error::Notification(format!("failed to wait for {program}: {e}")));
                }
            }
        }
    }
}

/// Prints the message. Used for dry runs and when no mail is configured.
pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn send(&self, subject: &str, body: &str) -> Result<()> {
        println!("Subject: {subject}\n\n{body}");
        Ok(())
    }
}
