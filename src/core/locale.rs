//! Localized cue phrases (Odia, Hindi, English)

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::types::{Cue, Language};

lazy_static! {
    static ref PHRASES: HashMap<(Cue, Language), &'static str> = {
        use Cue::*;
        use Language::*;
        let rows: [(Cue, [&'static str; 3]); 11] = [
            (CameraStarted, [
                "କ୍ୟାମେରା ଚାଲୁ କରନ୍ତୁ",
                "कैमरा शुरू करें",
                "Start camera",
            ]),
            (CameraStopped, [
                "କ୍ୟାମେରା ବନ୍ଦ କରନ୍ତୁ",
                "कैमरा बंद करें",
                "Stop camera",
            ]),
            (GestureDetected, [
                "ହସ୍ତଚାଳନା ଚିହ୍ନଟ ହୋଇଛି",
                "हावभाव पहचाना गया",
                "Gesture detected",
            ]),
            (TargetHit, [
                "ବହୁତ ଭଲ! ଆପଣ ନିଉଟନ୍ର ନିୟମ ବୁଝିଛନ୍ତି!",
                "बहुत अच्छा! आपने न्यूटन के नियम समझे!",
                "Excellent! You understood Newton's laws!",
            ]),
            (ShapeCorrect, [
                "ଠିକ୍ ଆକୃତି!",
                "सही आकृति!",
                "Correct shape!",
            ]),
            (Neutralization, [
                "ଅମ୍ଳ-କ୍ଷାର ପ୍ରତିକ୍ରିୟା! ଲବଣ ଓ ପାଣି ଉତ୍ପନ୍ନ ହେଲା",
                "अम्ल-क्षार अभिक्रिया! लवण और पानी बना",
                "Acid-Base reaction! Salt and water produced",
            ]),
            (BaseCaution, [
                "କ୍ଷାର ମିଶ୍ରଣ - ସତର୍କ ରହନ୍ତୁ!",
                "क्षार मिश्रण - सावधान रहें!",
                "Base mixture - be cautious!",
            ]),
            (PartIdentified, [
                "ଠିକ୍ ଅଙ୍ଗ ଚିହ୍ନଟ ହେଲା!",
                "सही अंग पहचाना!",
                "Correct part identified!",
            ]),
            (ProgramCorrect, [
                "ଅଭିନନ୍ଦନ! ଆପଣ ଠିକ୍ କୋଡ୍ ଲେଖିଛନ୍ତି!",
                "बधाई! आपने सही कोड लिखा है!",
                "Congratulations! You wrote the correct code!",
            ]),
            (TryAgain, [
                "ପୁନର୍ବାର ଚେଷ୍ଟା କରନ୍ତୁ!",
                "फिर से कोशिश करें!",
                "Try again!",
            ]),
            (NewChallenge, [
                "ନୂଆ ଆହ୍ୱାନ",
                "नई चुनौती",
                "New challenge",
            ]),
        ];

        let mut table = HashMap::new();
        for (cue, [odia, hindi, english]) in rows {
            table.insert((cue, Odia), odia);
            table.insert((cue, Hindi), hindi);
            table.insert((cue, English), english);
        }
        table
    };
}

/// Phrase for a cue in the given language, English if the table has a gap
pub fn phrase(cue: Cue, language: Language) -> &'static str {
    PHRASES
        .get(&(cue, language))
        .or_else(|| PHRASES.get(&(cue, Language::English)))
        .copied()
        .unwrap_or("")
}
