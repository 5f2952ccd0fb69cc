use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::collections::BTreeMap;

static CONTENT_DIR: Dir = include_dir!("src/content");

/// A full problem whose reference solution is the typing target.
#[allow(dead_code)]
#[derive(Clone, Debug, Deserialize)]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub topic: String,
    pub description: String,
    pub solution: String,
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// A short drill for one common code pattern.
#[derive(Clone, Debug, Deserialize)]
pub struct MicroDrill {
    pub id: String,
    pub title: String,
    pub pattern: String,
    pub description: String,
}

/// All embedded content for one programming language.
#[derive(Clone, Debug, Deserialize)]
pub struct ProblemSet {
    pub language: String,
    pub topics: BTreeMap<String, Vec<Problem>>,
    pub drills: Vec<MicroDrill>,
}

impl ProblemSet {
    /// Load the embedded set for `language`, if one is bundled.
    pub fn load(language: &str) -> Option<Self> {
        let file = CONTENT_DIR.get_file(format!("{language}.json"))?;
        let contents = file.contents_utf8()?;
        serde_json::from_str(contents).ok()
    }

    /// Names of all bundled languages.
    pub fn languages() -> Vec<String> {
        let mut names: Vec<String> = CONTENT_DIR
            .files()
            .filter_map(|file| {
                file.path()
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_owned)
            })
            .collect();
        names.sort();
        names
    }

    pub fn topics(&self) -> Vec<&str> {
        self.topics.keys().map(String::as_str).collect()
    }

    pub fn problems_for_topic(&self, topic: &str) -> &[Problem] {
        self.topics.get(topic).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn random_problem_by_topic(&self, topic: &str) -> Option<&Problem> {
        self.problems_for_topic(topic).choose(&mut rand::thread_rng())
    }

    pub fn random_problem(&self) -> Option<&Problem> {
        let topics: Vec<&String> = self.topics.keys().collect();
        let topic = topics.choose(&mut rand::thread_rng())?;
        self.random_problem_by_topic(topic)
    }

    pub fn problem(&self, id: &str) -> Option<&Problem> {
        self.topics.values().flatten().find(|problem| problem.id == id)
    }

    pub fn random_drill(&self) -> Option<&MicroDrill> {
        self.drills.choose(&mut rand::thread_rng())
    }
}
