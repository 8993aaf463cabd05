//! The [FontManager] keeps parsed font sources by name, and builds size-specialized [FontFace]s from them on demand.
//!
//! Faces are memoized under a [FaceKey] made of the source name and the exact bit patterns of the size and line
//! height, so two requests for the same name and size always get the same face, and sizes that differ at all never
//! share one.
use std::io::Read;
use std::sync::Arc;

use crate::*;

/// A float usable as part of a hash key.  `-0.0` is folded into `0.0`; every other value keeps its bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeKey(u64);

impl SizeKey {
    pub fn new(value: f64) -> SizeKey {
        // Adding zero turns -0.0 into 0.0 and leaves everything else alone.
        SizeKey((value + 0.0).to_bits())
    }

    pub fn value(&self) -> f64 {
        f64::from_bits(self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FaceKey {
    pub name: String,
    pub size: SizeKey,
    pub line_height: Option<SizeKey>,
}

/// A source font at a particular size.
#[derive(Debug)]
pub struct FontFace<F> {
    source: Arc<F>,
    size: f64,
    line_height: Option<f64>,
}

impl<F> FontFace<F> {
    pub fn source(&self) -> &Arc<F> {
        &self.source
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    /// The line height override, if one was requested.
    pub fn line_height(&self) -> Option<f64> {
        self.line_height
    }
}

fn check_size(size: f64) -> Result<()> {
    if size.is_finite() && size > 0.0 {
        Ok(())
    } else {
        Err(ResourceError::InvalidFaceSize(size))
    }
}

pub struct FontManager<S: ByteSource, D: Decoder> {
    source: S,
    decoder: D,
    fonts: KeyedCache<D::Output>,
    faces: KeyedCache<FontFace<D::Output>, FaceKey>,
}

impl<S: ByteSource, D: Decoder> FontManager<S, D> {
    pub fn new(source: S, decoder: D) -> FontManager<S, D> {
        FontManager {
            source,
            decoder,
            fonts: KeyedCache::new(),
            faces: KeyedCache::new(),
        }
    }

    fn parse(&self, name: &str, reader: impl Read) -> Result<D::Output> {
        self.decoder.decode(reader).map_err(|e| {
            tracing::warn!(name, "failed to parse font: {}", e);
            ResourceError::decode(name, e)
        })
    }

    /// Load the font at `path` under `name`, replacing any font already there.
    pub fn load_font(&mut self, name: &str, path: &str) -> Result<Arc<D::Output>> {
        let reader = self
            .source
            .open(path)
            .map_err(|e| ResourceError::from_io(path, e))?;
        let font = self.parse(name, reader)?;
        tracing::debug!(name, path, "loaded font");
        Ok(self.insert_source(name, font))
    }

    /// Parse `data` as a font and store it under `name`.
    pub fn load_font_data(&mut self, name: &str, data: &[u8]) -> Result<Arc<D::Output>> {
        let font = self.parse(name, data)?;
        Ok(self.insert_source(name, font))
    }

    /// Load several in-memory fonts, stopping at the first which fails to parse.
    ///
    /// Fonts before the failing one stay loaded.
    pub fn load_fonts_data<N: AsRef<str>, B: AsRef<[u8]>>(&mut self, fonts: &[(N, B)]) -> Result<()> {
        for (name, data) in fonts {
            self.load_font_data(name.as_ref(), data.as_ref())?;
        }
        Ok(())
    }

    fn insert_source(&mut self, name: &str, font: D::Output) -> Arc<D::Output> {
        let font = Arc::new(font);
        if self.fonts.put(name.to_string(), font.clone()).is_some() {
            // Faces built from the old source would otherwise outlive it.
            self.drop_faces(name);
        }
        font
    }

    fn drop_faces(&mut self, name: &str) {
        self.faces.retain(|k, _| k.name != name);
    }

    /// Get a face for the font `name` at `size`, building and caching it if needed.
    pub fn get_face(&mut self, name: &str, size: f64) -> Result<Arc<FontFace<D::Output>>> {
        self.build_face(name, size, None)
    }

    /// As [FontManager::get_face], with the line height overridden.
    pub fn get_face_with_line_height(
        &mut self,
        name: &str,
        size: f64,
        line_height: f64,
    ) -> Result<Arc<FontFace<D::Output>>> {
        check_size(line_height)?;
        self.build_face(name, size, Some(line_height))
    }

    fn build_face(
        &mut self,
        name: &str,
        size: f64,
        line_height: Option<f64>,
    ) -> Result<Arc<FontFace<D::Output>>> {
        check_size(size)?;
        let key = FaceKey {
            name: name.to_string(),
            size: SizeKey::new(size),
            line_height: line_height.map(SizeKey::new),
        };

        let fonts = &self.fonts;
        self.faces.get_or_load(&key, || {
            let source = fonts
                .get(name)
                .ok_or_else(|| ResourceError::FontNotFound(name.to_string()))?;
            tracing::trace!(name, size, ?line_height, "building face");
            Ok(FontFace {
                source,
                size,
                line_height,
            })
        })
    }

    /// The parsed source stored under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<D::Output>> {
        self.fonts.get(name)
    }

    /// Store an already-parsed source under `name`.
    pub fn put(&mut self, name: &str, font: impl Into<Arc<D::Output>>) {
        let font = font.into();
        if self.fonts.put(name.to_string(), font).is_some() {
            self.drop_faces(name);
        }
    }

    /// Remove the source stored under `name`, and every face built from it.
    pub fn remove(&mut self, name: &str) {
        self.fonts.remove(name);
        self.drop_faces(name);
    }

    /// Drop every cached face, keeping the sources.
    pub fn purge_cache(&mut self) {
        self.faces.clear();
    }

    /// Drop every face and every source.
    pub fn clear(&mut self) {
        tracing::debug!(
            fonts = self.fonts.len(),
            faces = self.faces.len(),
            "clearing fonts"
        );
        self.faces.clear();
        self.fonts.clear();
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// "Parses" a font by reading it as a string; empty input is malformed.
    struct NameDecoder;

    impl Decoder for NameDecoder {
        type Output = String;
        type Error = std::io::Error;

        fn decode<R: Read>(&self, mut reader: R) -> std::io::Result<String> {
            let mut out = String::new();
            reader.read_to_string(&mut out)?;
            if out.is_empty() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "empty font",
                ));
            }
            Ok(out)
        }
    }

    fn build_manager() -> (Arc<MemorySource>, FontManager<Arc<MemorySource>, NameDecoder>) {
        let source = Arc::new(MemorySource::new());
        (source.clone(), FontManager::new(source, NameDecoder))
    }

    #[test]
    fn faces_are_memoized_per_size() {
        let (_, mut fonts) = build_manager();
        fonts.load_font_data("body", b"body-font").unwrap();

        let a = fonts.get_face("body", 16.0).unwrap();
        let b = fonts.get_face("body", 16.0).unwrap();
        let c = fonts.get_face("body", 18.0).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.size(), 18.0);
        assert_eq!(&**a.source(), "body-font");
        assert_eq!(fonts.face_count(), 2);
    }

    #[test]
    fn close_sizes_do_not_collide() {
        let (_, mut fonts) = build_manager();
        fonts.load_font_data("body", b"x").unwrap();

        let a = fonts.get_face("body", 16.0).unwrap();
        let b = fonts.get_face("body", 16.000_000_000_000_004).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));

        // The same printed value is the same face.
        let c = fonts.get_face("body", "16".parse().unwrap()).unwrap();
        assert!(Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn names_do_not_bleed_into_sizes() {
        // With naive concatenation "a1" at 2.0 and "a" at 12.0 would both be "a12".
        let (_, mut fonts) = build_manager();
        fonts.load_font_data("a1", b"one").unwrap();
        fonts.load_font_data("a", b"two").unwrap();

        let x = fonts.get_face("a1", 2.0).unwrap();
        let y = fonts.get_face("a", 12.0).unwrap();
        assert!(!Arc::ptr_eq(&x, &y));
        assert_eq!(&**y.source(), "two");
    }

    #[test]
    fn line_height_is_part_of_the_key() {
        let (_, mut fonts) = build_manager();
        fonts.load_font_data("body", b"x").unwrap();

        let plain = fonts.get_face("body", 12.0).unwrap();
        let tall = fonts.get_face_with_line_height("body", 12.0, 20.0).unwrap();
        let tall_again = fonts.get_face_with_line_height("body", 12.0, 20.0).unwrap();
        assert!(!Arc::ptr_eq(&plain, &tall));
        assert!(Arc::ptr_eq(&tall, &tall_again));
        assert_eq!(tall.line_height(), Some(20.0));
        assert_eq!(plain.line_height(), None);
    }

    #[test]
    fn missing_font() {
        let (_, mut fonts) = build_manager();
        assert!(matches!(
            fonts.get_face("nope", 12.0),
            Err(ResourceError::FontNotFound(ref n)) if n == "nope"
        ));
        assert_eq!(fonts.face_count(), 0);

        // Loading it later makes the same request succeed.
        fonts.load_font_data("nope", b"now here").unwrap();
        fonts.get_face("nope", 12.0).unwrap();
    }

    #[test]
    fn invalid_sizes() {
        let (_, mut fonts) = build_manager();
        fonts.load_font_data("body", b"x").unwrap();
        for size in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                fonts.get_face("body", size),
                Err(ResourceError::InvalidFaceSize(_))
            ));
        }
    }

    #[test]
    fn load_from_source() {
        let (source, mut fonts) = build_manager();
        source.insert("fonts/body.ttf", "from disk");
        source.insert("fonts/broken.ttf", "");

        fonts.load_font("body", "fonts/body.ttf").unwrap();
        assert_eq!(fonts.get("body").as_deref().map(|s| s.as_str()), Some("from disk"));

        assert!(matches!(
            fonts.load_font("x", "fonts/missing.ttf"),
            Err(ResourceError::NotFound { .. })
        ));
        assert!(matches!(
            fonts.load_font("broken", "fonts/broken.ttf"),
            Err(ResourceError::Decode { .. })
        ));
        assert!(fonts.get("broken").is_none());
    }

    #[test]
    fn bulk_load_reports_failures() {
        let (_, mut fonts) = build_manager();
        let set: [(&str, &[u8]); 3] = [("regular", b"r"), ("italic", b""), ("bold", b"b")];
        match fonts.load_fonts_data(&set) {
            Err(ResourceError::Decode { key, .. }) => assert_eq!(key, "italic"),
            other => panic!("expected a decode error, got {:?}", other),
        }
        assert!(fonts.get("regular").is_some());
        assert!(fonts.get("italic").is_none());
        assert!(fonts.get("bold").is_none());
    }

    #[test]
    fn replacing_or_removing_a_source_drops_its_faces() {
        let (_, mut fonts) = build_manager();
        fonts.load_font_data("body", b"old").unwrap();
        fonts.load_font_data("title", b"t").unwrap();
        let old = fonts.get_face("body", 10.0).unwrap();
        fonts.get_face("title", 10.0).unwrap();

        fonts.load_font_data("body", b"new").unwrap();
        let new = fonts.get_face("body", 10.0).unwrap();
        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(&**new.source(), "new");

        fonts.remove("body");
        assert_eq!(fonts.face_count(), 1);
        assert!(fonts.get_face("body", 10.0).is_err());
    }

    #[test]
    fn purge_and_clear() {
        let (_, mut fonts) = build_manager();
        fonts.put("body", "direct".to_string());
        let a = fonts.get_face("body", 10.0).unwrap();

        fonts.purge_cache();
        assert_eq!(fonts.face_count(), 0);
        let b = fonts.get_face("body", 10.0).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));

        fonts.clear();
        assert!(fonts.get("body").is_none());
        assert!(matches!(
            fonts.get_face("body", 10.0),
            Err(ResourceError::FontNotFound(_))
        ));
    }
}
