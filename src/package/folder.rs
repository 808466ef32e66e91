use std::fmt;

use serde::{Serialize, Serializer};

/// Top-level folders a package may place files into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FolderKind {
    Lib,
    Src,
    Content,
    Tools,
    Build,
}

impl FolderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FolderKind::Lib => "lib",
            FolderKind::Src => "src",
            FolderKind::Content => "content",
            FolderKind::Tools => "tools",
            FolderKind::Build => "build",
        }
    }

    /// Case-insensitive lookup of a folder name.
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Lib, Self::Src, Self::Content, Self::Tools, Self::Build]
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }
}

/// Destination folder inside a package, e.g. `lib/net472`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageFolder {
    kind: FolderKind,
    sub_path: Vec<String>,
}

impl PackageFolder {
    pub fn new(kind: FolderKind) -> Self {
        Self {
            kind,
            sub_path: Vec::new(),
        }
    }

    pub fn lib() -> Self {
        Self::new(FolderKind::Lib)
    }

    pub fn src() -> Self {
        Self::new(FolderKind::Src)
    }

    pub fn content() -> Self {
        Self::new(FolderKind::Content)
    }

    /// Append a sub-path segment.
    pub fn join(mut self, segment: impl Into<String>) -> Self {
        self.sub_path.push(segment.into());
        self
    }

    pub fn kind(&self) -> FolderKind {
        self.kind
    }

    pub fn sub_path(&self) -> &[String] {
        &self.sub_path
    }

    /// Map an item's `PackagePath` to a folder.
    ///
    /// The first segment picks the folder kind; a path whose first segment is
    /// not a known folder lands under `content` with every segment kept.
    /// Both `/` and `\` separate segments.
    pub fn from_package_path(path: &str) -> Self {
        let mut segments = path
            .split(['/', '\\'])
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .peekable();

        let kind = match segments.peek().and_then(|first| FolderKind::from_name(first)) {
            Some(kind) => {
                segments.next();
                kind
            }
            None => FolderKind::Content,
        };

        Self {
            kind,
            sub_path: segments.collect(),
        }
    }
}

impl fmt::Display for PackageFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.as_str())?;
        for segment in &self.sub_path {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl Serialize for PackageFolder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
