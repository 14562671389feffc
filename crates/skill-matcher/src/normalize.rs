//! Skill-list to comparison-phrase normalization.
//!
//! Entries are joined verbatim: no case folding, trimming or filtering of
//! blank entries. Interpreting the text is the provider's job.

use skill_types::User;

/// Separator placed between skills in a phrase
pub const PHRASE_SEPARATOR: &str = ", ";

/// Phrase used for an empty skill list, so providers never compare against ""
pub const EMPTY_SKILLS_SENTINEL: &str = "nothing";

/// Join a skill list into one phrase.
pub fn skill_phrase<S: AsRef<str>>(skills: &[S]) -> String {
    if skills.is_empty() {
        return EMPTY_SKILLS_SENTINEL.to_string();
    }
    skills
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(PHRASE_SEPARATOR)
}

/// Phrase describing what `user` can teach.
pub fn offered_phrase(user: &User) -> String {
    skill_phrase(&user.skills_offered)
}

/// Phrase describing what `user` wants to learn.
pub fn wanted_phrase(user: &User) -> String {
    skill_phrase(&user.skills_wanted)
}
