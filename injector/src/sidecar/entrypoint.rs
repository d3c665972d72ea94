/// An executable together with its arguments.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invocation {
    pub executable: String,

    pub args: Vec<String>,
}

impl Invocation {
    /// Wraps the invocation in a headless, multi-client debugger listening on
    /// `port`. The wrapped arguments follow the `--` separator unchanged.
    pub fn under_debugger(self, debugger_path: &str, port: i32) -> Self {
        let Self { executable, args } = self;
        let wrapper = [
            format!("--listen=:{port}"),
            "--accept-multiclient".to_string(),
            "--headless=true".to_string(),
            "--log".to_string(),
            "--api-version=2".to_string(),
            "exec".to_string(),
            executable,
            "--".to_string(),
        ];
        Self { executable: debugger_path.to_string(), args: wrapper.into_iter().chain(args).collect() }
    }
}

/// How the container starts the sidecar process.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Entrypoint {
    /// The image entrypoint runs; the whole invocation goes into `args`.
    Implicit { args: Vec<String> },

    /// The executable is set as the container command.
    Explicit { command: Vec<String>, args: Vec<String> },
}

impl Entrypoint {
    pub fn new(invocation: Invocation, explicit: bool) -> Self {
        let Invocation { executable, args } = invocation;
        if explicit {
            Self::Explicit { command: vec![executable], args }
        } else {
            Self::Implicit { args: std::iter::once(executable).chain(args).collect() }
        }
    }

    /// Splits into the container `command` and `args` fields.
    pub fn into_container_fields(self) -> (Option<Vec<String>>, Vec<String>) {
        match self {
            Self::Implicit { args } => (None, args),
            Self::Explicit { command, args } => (Some(command), args),
        }
    }
}
