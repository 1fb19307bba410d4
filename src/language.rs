//! Language detection behind a small trait so the engine can be tested with
//! a scripted detector.

use whatlang::Lang;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// ISO 639-1 code where one exists, ISO 639-3 otherwise.
    Detected(String),
    Undetermined,
}

pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Detection;
}

#[derive(Debug, Clone, Default)]
pub struct WhatlangDetector {
    min_confidence: f64,
}

impl WhatlangDetector {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Detection {
        match whatlang::detect(text) {
            Some(info) if info.confidence() > 0.0 && info.confidence() >= self.min_confidence => {
                Detection::Detected(lang_to_code(info.lang()).to_string())
            }
            Some(info) => {
                tracing::debug!(
                    lang = info.lang().code(),
                    confidence = info.confidence(),
                    "Language detection below confidence floor"
                );
                Detection::Undetermined
            }
            None => Detection::Undetermined,
        }
    }
}

fn lang_to_code(lang: Lang) -> &'static str {
    use whatlang::Lang::*;
    match lang {
        Eng => "en",
        Deu => "de",
        Fra => "fr",
        Spa => "es",
        Ita => "it",
        Por => "pt",
        Nld => "nl",
        Pol => "pl",
        Rus => "ru",
        Ukr => "uk",
        Tur => "tr",
        Swe => "sv",
        Dan => "da",
        Nob => "no",
        Fin => "fi",
        Hun => "hu",
        Ces => "cs",
        Ron => "ro",
        Ell => "el",
        Ara => "ar",
        Heb => "he",
        Hin => "hi",
        Jpn => "ja",
        Kor => "ko",
        Cmn => "zh-cn",
        Vie => "vi",
        Tha => "th",
        Ind => "id",
        other => other.code(),
    }
}
