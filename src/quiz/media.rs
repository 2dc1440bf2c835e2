//! Pictures referenced by questions.
//!
//! LaTeXML keeps `\includegraphics` as `<graphics graphic="..."/>`. Each
//! picture is looked up next to the TeX file, converted to PNG when the
//! browser cannot show it, and embedded in the Moodle XML as base64.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::EmbeddedFile;
use crate::hash::{content_hash, short_hex};
use crate::runner::{CommandRunner, Invocation, run_lenient};

/// Extensions tried when `\includegraphics` omits one, in order.
const EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "svg", "pdf", "eps"];

/// Formats a browser displays as is.
const WEB_FORMATS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "svg"];

// =============================================================================
// MediaStore
// =============================================================================

/// Resolves, converts and deduplicates embedded pictures.
pub struct MediaStore<'r> {
    input_dir: PathBuf,
    working_dir: PathBuf,
    magick: Option<PathBuf>,
    runner: &'r dyn CommandRunner,
    /// Content hash → embedded file
    by_hash: FxHashMap<u64, EmbeddedFile>,
    /// Embedded name → content hash
    names: FxHashMap<String, u64>,
}

impl<'r> MediaStore<'r> {
    pub fn new(
        input_dir: &Path,
        working_dir: &Path,
        magick: Option<PathBuf>,
        runner: &'r dyn CommandRunner,
    ) -> Self {
        Self {
            input_dir: input_dir.to_path_buf(),
            working_dir: working_dir.to_path_buf(),
            magick,
            runner,
            by_hash: FxHashMap::default(),
            names: FxHashMap::default(),
        }
    }

    /// Number of distinct files embedded so far.
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    /// Embed the picture named `graphic`.
    ///
    /// `candidates` is LaTeXML's comma separated list of files it matched.
    /// Returns `None`, after a warning, when the picture cannot be used.
    pub fn embed(&mut self, graphic: &str, candidates: Option<&str>) -> Option<EmbeddedFile> {
        let Some(source) = self.resolve(graphic, candidates) else {
            warn!(graphic, dir = %self.input_dir.display(), "image not found, skipped");
            return None;
        };
        let (name, bytes) = self.load(&source)?;
        let hash = content_hash(&bytes);
        if let Some(existing) = self.by_hash.get(&hash) {
            return Some(existing.clone());
        }

        let name = self.unique_name(name, hash);
        let file = EmbeddedFile {
            name: name.clone(),
            base64: STANDARD.encode(&bytes),
        };
        debug!(name = %file.name, source = %source.display(), "image embedded");
        self.names.insert(name, hash);
        self.by_hash.insert(hash, file.clone());
        Some(file)
    }

    /// First existing file among the plausible spellings.
    fn resolve(&self, graphic: &str, candidates: Option<&str>) -> Option<PathBuf> {
        let mut tries = vec![graphic.to_string()];
        tries.extend(EXTENSIONS.iter().map(|ext| format!("{graphic}.{ext}")));
        if let Some(list) = candidates {
            tries.extend(list.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from));
        }
        tries
            .into_iter()
            .map(|name| {
                let path = PathBuf::from(name);
                if path.is_absolute() { path } else { self.input_dir.join(path) }
            })
            .find(|path| path.is_file())
    }

    /// Read a web format directly, convert anything else to PNG.
    fn load(&self, source: &Path) -> Option<(String, Vec<u8>)> {
        let ext = source
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let stem = sanitize(
            &source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string()),
        );

        let (name, path) = if WEB_FORMATS.contains(&ext.as_str()) {
            (format!("{stem}.{ext}"), source.to_path_buf())
        } else {
            (format!("{stem}.png"), self.convert_to_png(source, &stem)?)
        };

        match std::fs::read(&path) {
            Ok(bytes) => Some((name, bytes)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "image unreadable, skipped");
                None
            }
        }
    }

    fn convert_to_png(&self, source: &Path, stem: &str) -> Option<PathBuf> {
        let Some(magick) = &self.magick else {
            warn!(
                source = %source.display(),
                "ImageMagick not found, cannot convert image to PNG, skipped"
            );
            return None;
        };
        let dest = self
            .working_dir
            .join(format!("{stem}-{}.png", short_hex(content_hash(source.as_os_str().as_encoded_bytes()))));
        let invocation = Invocation::new(magick)
            .arg("-density")
            .arg("150")
            .arg(source)
            .arg(&dest)
            .quiet();
        let exit = run_lenient(self.runner, &invocation);
        if exit.success && dest.is_file() {
            Some(dest)
        } else {
            warn!(source = %source.display(), "image conversion failed, skipped");
            None
        }
    }

    /// Keep `name` unless a different content already uses it.
    fn unique_name(&self, name: String, hash: u64) -> String {
        match self.names.get(&name) {
            Some(&existing) if existing != hash => match name.rsplit_once('.') {
                Some((stem, ext)) => format!("{stem}-{}.{ext}", short_hex(hash)),
                None => format!("{name}-{}", short_hex(hash)),
            },
            _ => name,
        }
    }
}

/// Keep file names safe inside a `@@PLUGINFILE@@` URL.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertResult;
    use crate::runner::{Exit, SystemRunner};

    /// Pretends to be ImageMagick: copies the source bytes to the target.
    struct FakeMagick;

    impl CommandRunner for FakeMagick {
        fn run(&self, invocation: &Invocation) -> ConvertResult<Exit> {
            let n = invocation.args.len();
            std::fs::copy(&invocation.args[n - 2], &invocation.args[n - 1]).unwrap();
            Ok(Exit::OK)
        }
    }

    #[test]
    fn test_embed_and_dedupe() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fig.png"), b"\x89PNG one").unwrap();
        std::fs::write(dir.path().join("copy.png"), b"\x89PNG one").unwrap();

        let mut media = MediaStore::new(dir.path(), dir.path(), None, &SystemRunner);
        let a = media.embed("fig", None).unwrap();
        assert_eq!(a.name, "fig.png");
        assert_eq!(a.base64, STANDARD.encode(b"\x89PNG one"));

        // Same bytes under another name reuse the first file
        let b = media.embed("copy.png", None).unwrap();
        assert_eq!(b, a);
        assert_eq!(media.len(), 1);
    }

    #[test]
    fn test_name_clash_gets_hash_suffix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("fig.png"), b"first").unwrap();
        std::fs::write(dir.path().join("sub/fig.png"), b"second").unwrap();

        let mut media = MediaStore::new(dir.path(), dir.path(), None, &SystemRunner);
        assert_eq!(media.embed("fig.png", None).unwrap().name, "fig.png");
        let second = media.embed("sub/fig", None).unwrap();
        assert_eq!(second.name, format!("fig-{}.png", short_hex(content_hash(b"second"))));
        assert_eq!(media.len(), 2);
    }

    #[test]
    fn test_candidates_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("plot v2.jpg"), b"jpeg").unwrap();

        let mut media = MediaStore::new(dir.path(), dir.path(), None, &SystemRunner);
        let file = media.embed("plot", Some("plot v2.jpg")).unwrap();
        assert_eq!(file.name, "plot_v2.jpg");
        assert!(media.embed("absent", None).is_none());
    }

    #[test]
    fn test_pdf_needs_imagemagick() {
        let dir = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("diagram.pdf"), b"%PDF-1.4").unwrap();

        let mut media = MediaStore::new(dir.path(), work.path(), None, &SystemRunner);
        assert!(media.embed("diagram", None).is_none());

        let mut media = MediaStore::new(dir.path(), work.path(), Some(PathBuf::from("magick")), &FakeMagick);
        let file = media.embed("diagram", None).unwrap();
        assert_eq!(file.name, "diagram.png");
        assert_eq!(file.base64, STANDARD.encode(b"%PDF-1.4"));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("my fig(1)"), "my_fig_1_");
        assert_eq!(sanitize("a-b_c.d"), "a-b_c.d");
    }
}
