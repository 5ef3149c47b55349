//! Shared constants: defaults, keyword lists and user-facing replies.

pub mod paths {
    pub const CONFIG_DIR_NAME: &str = ".vaani";
}

pub mod agent {
    /// Recognition confidence below this is never interpreted as data.
    pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;

    /// Profile fields collected before an eligibility check, in asking order.
    pub const DEFAULT_REQUIRED_FIELDS: &[&str] = &["age", "income"];

    /// Extra loop iterations on top of one per required field.
    ///
    /// Covers the eligibility check plus the step that follows the last fill.
    pub const ITERATION_SLACK: usize = 3;

    pub const DEFAULT_LANGUAGE: &str = "te";

    /// Tokens that turn a pending confirmation into a details request.
    pub const DETAILS_KEYWORDS: &[&str] = &["వివర", "వివరాలు", "details", "more", "about"];

    pub const AFFIRMATIVE_KEYWORDS: &[&str] = &["అవును", "అవు", "సరే", "yes"];
    pub const NEGATIVE_KEYWORDS: &[&str] = &["లేదు", "కాదు", "no"];
}

pub mod replies {
    pub const CLARIFY_ASR: &str =
        "క్షమించండి, నేను స్పష్టంగా వినలేకపోయాను. దయచేసి మళ్లీ రికార్డ్ చేయండి.";

    /// Prompt returned by the transcription endpoint on low confidence.
    pub const TRANSCRIBE_CLARIFY: &str =
        "క్షమించండి, నేను మీరు చెప్పినది స్పష్టంగా గ్రహించలేకపోయాను. దయచేసి మళ్లీ చెప్పగలరా?";

    pub const ASK_AGE: &str = "దయచేసి మీ వయస్సును చెప్పండి.";
    pub const ASK_INCOME: &str = "దయచేసి మీ వార్షిక ఆదాయాన్ని (ఒక సంఖ్యలో) చెప్పండి.";
    pub const ASK_UNKNOWN: &str = "సమాధానం తెలియదు.";

    pub const NO_MATCHING_OFFER: &str =
        "క్షమించండి, ప్రస్తుత సమాచారం ప్రకారం మీకు తెలియజేసేందుకు అనుకూలమైన పథకం కనిపించలేదు.";
    pub const NO_DETAILS: &str =
        "క్షమించండి, ఆ పథకం గురించి వివరాలు నాకు లభించలేదు. మీరు మరొకటి అడగాలనుకుంటున్నారా?";

    pub const DECLINED: &str =
        "సరే, నేను దరఖాస్తును నిలిపివెతున్నాను. మరింత సహాయం కావాలనుకుంటే చెప్పండి.";
    pub const CONFIRM_AGAIN: &str = "దయచేసి అవును లేదా కాదు అని చెప్పగలరా? (అవును/లేదు)";

    pub fn restate_field(field: &str) -> String {
        format!("క్షమించండి, మీ {field} గురించి స్పష్టంగా చెప్పగలరా?")
    }

    pub fn eligible_offers(names: &str) -> String {
        format!("మీకు ఈ పథకాలకు అర్హత ఉంది: {names}. మీరు దరఖాస్తు చేయాలనుకుంటున్నారా? (అవును/లేదు)")
    }

    pub fn submitted(application_id: &str) -> String {
        format!("మీ దరఖాస్తు విజయవంతంగా సమర్పించబడింది. దరఖాస్తు ID: {application_id}")
    }

    pub fn submitted_direct(application_id: &str) -> String {
        format!("Your application has been submitted. ID: {application_id}")
    }
}
