//! Call-site resolution
//!
//! Every entry point threads an explicit number of frames to skip down to the
//! introspector. Skip `0` names the function that called
//! [`CallerIntrospector::resolve`]; each additional level walks one frame further
//! out, so a handle method resolves its caller with a skip of `2`
//! (`dispatch` → leveled method → caller) and a package-level wrapper with `3`.

use backtrace::Backtrace;

/// A resolved call site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Full source path as recorded in debug info
    pub file: String,
    pub line: u32,
    /// Fully qualified function name, when the symbol could be resolved
    pub function: Option<String>,
}

impl Caller {
    pub fn new(file: impl Into<String>, line: u32, function: Option<&str>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.map(String::from),
        }
    }
}

/// Resolves the logical caller `skip` frames above the function calling `resolve`.
pub trait CallerIntrospector: Send + Sync {
    fn resolve(&self, skip: usize) -> Option<Caller>;
}

/// Walks the native stack with the `backtrace` crate.
///
/// Inlined functions are reported as separate logical frames, so `#[inline]`
/// on an intermediate layer does not shift the result. Without debug info the
/// file and line are unavailable and `resolve` returns `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BacktraceIntrospector;

impl CallerIntrospector for BacktraceIntrospector {
    #[inline(never)]
    fn resolve(&self, skip: usize) -> Option<Caller> {
        let trace = Backtrace::new();

        let symbols: Vec<_> = trace
            .frames()
            .iter()
            .flat_map(|frame| frame.symbols().iter())
            .collect();

        let here = symbols.iter().position(|sym| {
            sym.name()
                .map(|n| {
                    let n = format!("{:#}", n);
                    n.contains("BacktraceIntrospector") && n.ends_with("::resolve")
                })
                .unwrap_or(false)
        })?;

        let target = symbols.get(here + 1 + skip)?;
        let file = target.filename()?.to_string_lossy().into_owned();
        let line = target.lineno()?;
        let function = target.name().map(|n| format!("{:#}", n));

        Some(Caller {
            file,
            line,
            function,
        })
    }
}

/// Always reports the same caller. Handy where output must be reproducible.
#[derive(Debug, Clone)]
pub struct FixedIntrospector(pub Option<Caller>);

impl CallerIntrospector for FixedIntrospector {
    fn resolve(&self, _skip: usize) -> Option<Caller> {
        self.0.clone()
    }
}

const CLOSURE_SEGMENT: &str = "::{{closure}}";

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Trim a full path to its last two segments: `dir/file.rs`.
pub fn short_file_name(path: &str) -> &str {
    let Some(last) = path.rfind(is_separator) else {
        return path;
    };
    match path[..last].rfind(is_separator) {
        Some(prev) => &path[prev + 1..],
        None => path,
    }
}

/// Drop module, type and package qualification, keeping the bare function name.
///
/// Closures are attributed to the function that defines them.
pub fn short_function_name(name: &str) -> &str {
    let mut name = name;
    while let Some(outer) = name.strip_suffix(CLOSURE_SEGMENT) {
        name = outer;
    }
    let after_path = name.rfind("::").map(|i| i + 2).unwrap_or(0);
    let after_dot = name.rfind('.').map(|i| i + 1).unwrap_or(0);
    &name[after_path.max(after_dot)..]
}

/// Builds the `file:line func(): ` prefix, or `?:?: ` when the caller is unknown.
pub fn call_site_prefix(caller: Option<&Caller>) -> String {
    match caller {
        Some(c) => format!(
            "{}:{} {}(): ",
            short_file_name(&c.file),
            c.line,
            c.function
                .as_deref()
                .map(short_function_name)
                .unwrap_or("?")
        ),
        None => "?:?: ".to_string(),
    }
}
