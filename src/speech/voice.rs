//! Ranking of native voices.
//!
//! Engines describe voices by id, display name and (usually) a BCP 47
//! language tag. Older macOS voices carry no locale in their id, so a short
//! table of well known names fills the gap.

/// Voice picked when several enhanced U.S. voices are installed
pub const PREFERRED_VOICE: &str = "samantha";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    pub id: String,
    pub name: String,
    pub language: String,
}

impl VoiceInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            language: language.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Us,
    Uk,
    Australia,
    Other,
}

/// Preference order, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display)]
pub enum VoiceTier {
    PreferredEnhancedUs,
    EnhancedUs,
    Us,
    Uk,
    Australia,
    OtherEnglish,
}

const LEGACY_NAMES: &[(&str, Region)] = &[
    ("samantha", Region::Us),
    ("alex", Region::Us),
    ("ava", Region::Us),
    ("allison", Region::Us),
    ("victoria", Region::Us),
    ("tom", Region::Us),
    ("daniel", Region::Uk),
    ("kate", Region::Uk),
    ("serena", Region::Uk),
    ("oliver", Region::Uk),
    ("karen", Region::Australia),
    ("lee", Region::Australia),
    ("moira", Region::Other),
    ("tessa", Region::Other),
    ("fiona", Region::Other),
];

fn region_of_tag(tag: &str) -> Option<Region> {
    let tag = tag.to_ascii_lowercase().replace('_', "-");
    let mut parts = tag.split('-');
    if parts.next()? != "en" {
        return None;
    }
    Some(match parts.next() {
        Some("us") => Region::Us,
        Some("gb") | Some("uk") => Region::Uk,
        Some("au") => Region::Australia,
        _ => Region::Other,
    })
}

/// English region of a voice, or `None` for non-English voices.
pub fn english_region(voice: &VoiceInfo) -> Option<Region> {
    if !voice.language.trim().is_empty() {
        return region_of_tag(voice.language.trim());
    }

    let id = voice.id.to_ascii_lowercase();
    if let Some(region) = id.split('.').find_map(region_of_tag) {
        return Some(region);
    }
    if id.ends_with(".english") {
        return Some(Region::Other);
    }

    let last = id.rsplit('.').next().unwrap_or_default();
    let name = voice.name.to_ascii_lowercase();
    LEGACY_NAMES
        .iter()
        .find(|(known, _)| *known == last || *known == name)
        .map(|(_, region)| *region)
}

fn is_enhanced(voice: &VoiceInfo) -> bool {
    let id = voice.id.to_ascii_lowercase();
    let name = voice.name.to_ascii_lowercase();
    ["enhanced", "premium"]
        .iter()
        .any(|q| id.contains(q) || name.contains(q))
}

fn is_preferred(voice: &VoiceInfo) -> bool {
    voice.name.to_ascii_lowercase().contains(PREFERRED_VOICE)
        || voice.id.to_ascii_lowercase().contains(PREFERRED_VOICE)
}

pub fn tier(voice: &VoiceInfo) -> Option<VoiceTier> {
    Some(match english_region(voice)? {
        Region::Us if is_enhanced(voice) && is_preferred(voice) => VoiceTier::PreferredEnhancedUs,
        Region::Us if is_enhanced(voice) => VoiceTier::EnhancedUs,
        Region::Us => VoiceTier::Us,
        Region::Uk => VoiceTier::Uk,
        Region::Australia => VoiceTier::Australia,
        Region::Other => VoiceTier::OtherEnglish,
    })
}

/// Pick the voice to use. A forced id wins over ranking when it is installed.
pub fn choose_voice<'a>(voices: &'a [VoiceInfo], forced_id: Option<&str>) -> Option<&'a VoiceInfo> {
    if let Some(forced) = forced_id.map(str::trim).filter(|f| !f.is_empty()) {
        match voices.iter().find(|v| v.id.eq_ignore_ascii_case(forced)) {
            Some(voice) => return Some(voice),
            None => tracing::warn!("voice '{forced}' is not installed; picking an English voice"),
        }
    }

    voices
        .iter()
        .filter_map(|v| tier(v).map(|t| (t, !is_preferred(v), v)))
        .min_by_key(|(t, not_preferred, _)| (*t, *not_preferred))
        .map(|(_, _, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(id: &str, name: &str, lang: &str) -> VoiceInfo {
        VoiceInfo::new(id, name, lang)
    }

    fn catalog() -> Vec<VoiceInfo> {
        vec![
            mac("com.apple.voice.compact.fr-FR.Thomas", "Thomas", "fr-FR"),
            mac("com.apple.voice.compact.en-AU.Karen", "Karen", "en-AU"),
            mac("com.apple.voice.compact.en-GB.Daniel", "Daniel", "en-GB"),
            mac("com.apple.voice.compact.en-US.Samantha", "Samantha", "en-US"),
            mac("com.apple.voice.enhanced.en-US.Evan", "Evan (Enhanced)", "en-US"),
            mac("com.apple.voice.enhanced.en-US.Samantha", "Samantha (Enhanced)", "en-US"),
        ]
    }

    #[test]
    fn enhanced_samantha_wins() {
        let voices = catalog();
        let chosen = choose_voice(&voices, None).unwrap();
        assert_eq!(chosen.id, "com.apple.voice.enhanced.en-US.Samantha");
    }

    #[test]
    fn ranking_walks_down_the_tiers() {
        let mut voices = catalog();

        voices.pop();
        assert_eq!(choose_voice(&voices, None).unwrap().name, "Evan (Enhanced)");

        voices.pop();
        assert_eq!(choose_voice(&voices, None).unwrap().name, "Samantha");

        voices.pop();
        assert_eq!(choose_voice(&voices, None).unwrap().name, "Daniel");

        voices.pop();
        assert_eq!(choose_voice(&voices, None).unwrap().name, "Karen");

        voices.pop();
        assert_eq!(choose_voice(&voices, None), None);
    }

    #[test]
    fn other_english_is_last_resort() {
        let voices = vec![
            mac("de", "Anna", "de-DE"),
            mac("ie", "Moira", "en-IE"),
        ];
        let chosen = choose_voice(&voices, None).unwrap();
        assert_eq!(tier(chosen), Some(VoiceTier::OtherEnglish));
    }

    #[test]
    fn forced_id_takes_precedence() {
        let voices = catalog();
        let chosen = choose_voice(&voices, Some("COM.APPLE.VOICE.COMPACT.FR-FR.THOMAS")).unwrap();
        assert_eq!(chosen.name, "Thomas");
    }

    #[test]
    fn unknown_forced_id_falls_back_to_ranking() {
        let voices = catalog();
        let chosen = choose_voice(&voices, Some("com.example.missing")).unwrap();
        assert_eq!(chosen.id, "com.apple.voice.enhanced.en-US.Samantha");
    }

    #[test]
    fn region_is_inferred_from_id_without_language() {
        assert_eq!(
            english_region(&mac("com.apple.voice.premium.en_GB.Serena", "Serena", "")),
            Some(Region::Uk)
        );
        assert_eq!(
            english_region(&mac("com.apple.speech.synthesis.voice.alex", "Alex", "")),
            Some(Region::Us)
        );
        assert_eq!(
            english_region(&mac("com.apple.speech.synthesis.voice.thomas", "Thomas", "")),
            None
        );
    }

    #[test]
    fn windows_style_tags_are_understood() {
        let zira = mac("TTS_MS_EN-US_ZIRA_11.0", "Microsoft Zira Desktop", "en-US");
        assert_eq!(tier(&zira), Some(VoiceTier::Us));
    }
}
