// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt templates. Each builder returns the full message list for one call.

use mindlog_core::ChatMessage;

use crate::summarize::ReportVariant;

const ENTRY_SYSTEM: &str = "You are a caring psychologist and friend. \
Reply warmly and informally, with empathy, the way a friend would write, never like a robot or a teacher. \
Return ONLY a JSON object with the keys:\n\
  supportiveResponse: a warm reply of at most 100 words\n\
  identifiedPatterns: an array of up to 3 negative thinking patterns\n\
  suggestedStrategies: an array of 2-3 practical strategies\n\
No markdown and no formatting.";

const REPORT_SYSTEM: &str = "You are a psychology coach. Answer with JSON only.";

const CHALLENGE_SYSTEM: &str = "You are an emotional wellbeing coach. \
Return only JSON with no markdown and no extra commentary.";

const MONTHLY_SYSTEM: &str = "You are a practising psychotherapist. Answer with JSON only.";

const PATTERNS_SYSTEM: &str = "You look for emotional triggers in journals. Answer with JSON only.";

/// Messages for a single entry analysis.
pub fn entry_messages(content: &str) -> Vec<ChatMessage> {
    let user = format!(
        "Below is an entry from the user's journal.\n\
ENTRY:\n\"{content}\"\n\
Please provide:\n\
1. A supportive reply (max 100 words)\n\
2. Up to 3 negative patterns\n\
3. 2-3 strategies or perspectives\n\
Return ONLY valid JSON with supportiveResponse, identifiedPatterns, suggestedStrategies."
    );
    vec![ChatMessage::system(ENTRY_SYSTEM), ChatMessage::user(user)]
}

/// Messages for a growth report over `digest`, asking for `variant`'s schema.
pub fn report_messages(variant: ReportVariant, digest: &str) -> Vec<ChatMessage> {
    let user = match variant {
        ReportVariant::Lite => format!(
            "Analyse this journal digest and return JSON:\n\
{{\n\
  \"progress\": \"3-4 sentences about improvements\",\n\
  \"areasToImprove\": [\"...\", \"...\"],\n\
  \"nextStep\": \"A short recommendation\",\n\
  \"moodTrend\": [{{ \"date\": \"YYYY-MM-DD\", \"score\": 1-10 }}]\n\
}}\n\n\
Digest:\n{digest}"
        ),
        ReportVariant::Full => format!(
            "You are an experienced coach and therapist. Analyse the digest and return JSON:\n\
{{\n\
  \"progress\": \"A paragraph about positive changes\",\n\
  \"areasToImprove\": [\"...\", \"...\", \"...\"],\n\
  \"nextStep\": \"One practical step\",\n\
  \"moodTrend\": [{{ \"date\": \"YYYY-MM-DD\", \"score\": 1-10 }}],\n\
  \"topEmotions\": [\"emotion 1\", \"emotion 2\", \"emotion 3\"]\n\
}}\n\n\
Digest:\n{digest}"
        ),
    };
    vec![ChatMessage::system(REPORT_SYSTEM), ChatMessage::user(user)]
}

/// Messages asking for exactly three challenges as a bare JSON array.
pub fn challenge_messages(entries_text: &str) -> Vec<ChatMessage> {
    let user = format!(
        "Below are the user's journal entries.\n\
Suggest exactly three short personal challenges that would improve their emotional state.\n\
Return ONLY a valid JSON array with no explanation. Each element has the form:\n\n\
{{\n\
  \"title\": \"Short title (at most 6 words)\",\n\
  \"description\": \"What to do (at most 25 words)\"\n\
}}\n\n\
Entries:\n{entries_text}"
    );
    vec![ChatMessage::system(CHALLENGE_SYSTEM), ChatMessage::user(user)]
}

/// Messages for the 30-day deep report.
pub fn monthly_messages(entries_text: &str) -> Vec<ChatMessage> {
    let user = format!(
        "Analyse the following journal entries from the last 30 days:\n\
- Identify the main highlights\n\
- Find emotional patterns\n\
- Give practical recommendations to improve mood\n\
Return JSON: {{ \"highlights\": [\"...\"], \"patterns\": [\"...\"], \"recommendations\": [\"...\"] }}\n\n\
Text:\n{entries_text}"
    );
    vec![ChatMessage::system(MONTHLY_SYSTEM), ChatMessage::user(user)]
}

/// Messages asking which themes lower and which lift the user's mood.
pub fn patterns_messages(entries_text: &str) -> Vec<ChatMessage> {
    let user = format!(
        "Analyse this text. Work out which topics or events most often cause negative emotions \
and which cause positive ones, then give short advice for a better emotional state.\n\
Return JSON: {{ \"negativeTriggers\": [\"...\"], \"positiveTriggers\": [\"...\"], \"recommendations\": [\"...\"] }}\n\n\
Text:\n{entries_text}"
    );
    vec![ChatMessage::system(PATTERNS_SYSTEM), ChatMessage::user(user)]
}
