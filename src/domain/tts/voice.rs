/// Fixed defaults applied when a document carries neither a language code
/// nor a voice name.
pub const DEFAULT_LANGUAGE_CODE: &str = "cmn-CN";
pub const DEFAULT_VOICE_NAME: &str = "Zhiyu";

/// Pick a default voice for a BCP-47 language tag when the document names
/// a language but no voice. Returns `None` for languages without a mapped
/// voice; the caller falls back to the configured default.
pub fn default_voice_for_language(language_code: &str) -> Option<&'static str> {
    let primary = language_code
        .split('-')
        .next()
        .unwrap_or(language_code)
        .to_ascii_lowercase();

    match primary.as_str() {
        "cmn" | "zh" => Some("Zhiyu"),
        "en" => Some("Joanna"),
        "es" => Some("Lupe"),
        "fr" => Some("Lea"),
        "de" => Some("Vicki"),
        "it" => Some("Bianca"),
        "pt" => Some("Ines"),
        "ja" => Some("Takumi"),
        "ko" => Some("Seoyeon"),
        "ar" => Some("Hala"),
        _ => None,
    }
}

/// Check if a voice supports the neural engine
/// Based on AWS Polly documentation
pub fn is_voice_neural_compatible(voice: &str) -> bool {
    const NEURAL_VOICES: &[&str] = &[
        // English
        "Joanna", "Matthew", "Ivy", "Kendra", "Kimberly", "Salli", "Joey", "Justin", "Kevin",
        // Spanish
        "Lupe", "Pedro", "Sergio", // French
        "Lea", "Remi", // German
        "Vicki", "Daniel", // Italian
        "Bianca", "Adriano", // Portuguese
        "Ines", "Camila", "Vitoria", "Thiago", // Japanese
        "Takumi", "Kazuha", "Tomoko",  // Korean
        "Seoyeon", // Mandarin Chinese
        "Zhiyu",   // Arabic
        "Hala", "Zayd",
    ];

    NEURAL_VOICES.contains(&voice)
}
