//! LaTeXML tree → [`Quiz`].
//!
//! Walks the document looking for the elements written by the AMC binding
//! (`question`, `choices`, `correctchoice`, `wrongchoice`, `element`,
//! `scoring`, `explain`). Names are matched without their prefix, so the
//! walk does not depend on how LaTeXML declares the namespace.
//!
//! A `scoring` element carrying `default="single|multiple"` sets the base
//! scoring of every question of that kind; a question's own `scoring`
//! elements are merged over it.

use std::path::Path;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::html::HtmlWriter;
use super::media::MediaStore;
use super::scoring::Scoring;
use super::{Answer, COURSE_ROOT, Category, Question, QuestionKind, Quiz, RichText};
use crate::error::{ConvertError, ConvertResult};
use crate::node::{Document, Element};

/// Result of an extraction.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub quiz: Quiz,
    /// Names of the questions left out, with the reason
    pub skipped: Vec<String>,
}

/// Build the quiz held in a LaTeXML document.
///
/// `category` is the base category name; `origin` labels the empty-quiz
/// error.
pub fn extract(
    doc: &Document,
    category: &str,
    origin: &Path,
    media: &mut MediaStore<'_>,
) -> ConvertResult<Extraction> {
    let mut extractor = Extractor {
        media,
        defaults: Defaults::collect(doc)?,
        categories: Vec::new(),
        index: FxHashMap::default(),
        skipped: Vec::new(),
        seen: 0,
    };
    let base = format!("{COURSE_ROOT}/{category}");
    extractor.visit(&doc.root, &base)?;

    let quiz = Quiz {
        categories: extractor.categories,
    };
    if quiz.question_count() == 0 {
        return Err(ConvertError::EmptyQuiz(origin.to_path_buf()));
    }
    debug!(
        categories = quiz.categories.len(),
        questions = quiz.question_count(),
        "quiz extracted"
    );
    Ok(Extraction {
        quiz,
        skipped: extractor.skipped,
    })
}

// =============================================================================
// Extractor
// =============================================================================

/// Document wide scoring, per question kind.
#[derive(Debug, Default)]
struct Defaults {
    single: Scoring,
    multiple: Scoring,
}

impl Defaults {
    /// Later defaults override earlier ones, key by key.
    fn collect(doc: &Document) -> ConvertResult<Self> {
        let mut defaults = Defaults::default();
        for directive in doc.find_all(|e| e.is("scoring") && e.get_attr("default").is_some()) {
            let scoring = Scoring::parse(directive.get_attr("value").unwrap_or_default())?;
            match directive.get_attr("default") {
                Some("multiple") => defaults.multiple.merge(scoring),
                _ => defaults.single.merge(scoring),
            }
        }
        Ok(defaults)
    }

    fn base(&self, kind: QuestionKind) -> Scoring {
        match kind {
            QuestionKind::Single => self.single.clone(),
            QuestionKind::Multiple => self.multiple.clone(),
        }
    }
}

struct Extractor<'m, 'r> {
    media: &'m mut MediaStore<'r>,
    defaults: Defaults,
    categories: Vec<Category>,
    /// Category path → position in `categories`
    index: FxHashMap<String, usize>,
    skipped: Vec<String>,
    /// Questions met so far, used to name anonymous ones
    seen: usize,
}

impl Extractor<'_, '_> {
    fn visit(&mut self, elem: &Element, category: &str) -> ConvertResult<()> {
        if elem.is("question") {
            self.seen += 1;
            let name = elem
                .get_attr("name")
                .map(str::to_string)
                .unwrap_or_else(|| format!("question-{}", self.seen));
            match self.question(elem, name.clone())? {
                Ok(question) => self.category(category).questions.push(question),
                Err(reason) => {
                    warn!(question = %name, reason, "question skipped");
                    self.skipped.push(format!("{name}: {reason}"));
                }
            }
            return Ok(());
        }

        if elem.is("element") {
            let group = elem.get_attr("name").unwrap_or_default().trim();
            let path = if group.is_empty() {
                category.to_string()
            } else {
                format!("{category}/{group}")
            };
            for child in elem.children_elements() {
                self.visit(child, &path)?;
            }
            return Ok(());
        }

        for child in elem.children_elements() {
            self.visit(child, category)?;
        }
        Ok(())
    }

    fn category(&mut self, path: &str) -> &mut Category {
        let idx = match self.index.get(path) {
            Some(&idx) => idx,
            None => {
                self.categories.push(Category {
                    path: path.to_string(),
                    questions: Vec::new(),
                });
                self.index.insert(path.to_string(), self.categories.len() - 1);
                self.categories.len() - 1
            }
        };
        &mut self.categories[idx]
    }

    /// Build one question. The inner `Err` is a skip reason; the outer one
    /// a hard failure (bad scoring directive).
    fn question(&mut self, elem: &Element, name: String) -> ConvertResult<Result<Question, &'static str>> {
        let kind = QuestionKind::from_attr(elem.get_attr("type"));

        let Some(choices) = find_outside_choices(elem, "choices") else {
            return Ok(Err("no choices"));
        };
        let shuffle = !choices.get_attr("options").unwrap_or_default().contains('o');

        let mut scoring = self.defaults.base(kind);
        for directive in find_all_outside_choices(elem, "scoring") {
            if directive.get_attr("default").is_some() {
                continue;
            }
            scoring.merge(Scoring::parse(directive.get_attr("value").unwrap_or_default())?);
        }

        let options = find_options(choices);
        let n_correct = options.iter().filter(|(correct, _)| *correct).count();
        let n_wrong = options.len() - n_correct;
        match kind {
            QuestionKind::Single if n_correct != 1 => {
                return Ok(Err("single answer question needs exactly one correct choice"));
            }
            QuestionKind::Multiple if n_correct == 0 => {
                return Ok(Err("multiple answer question has no correct choice"));
            }
            _ => {}
        }

        let fractions = scoring.fractions(kind, n_correct, n_wrong);
        if !fractions.is_complete(n_correct) {
            return Ok(Err("correct answer grades cannot add up to 100%"));
        }
        let answers = options
            .into_iter()
            .map(|(correct, choice)| Answer {
                text: self.rich(choice),
                correct,
                fraction: if correct { fractions.correct } else { fractions.wrong },
            })
            .collect();

        let feedback = find_outside_choices(elem, "explain")
            .map(|explain| self.rich(explain))
            .filter(|text| !text.is_empty());

        Ok(Ok(Question {
            name,
            kind,
            text: self.rich(elem),
            answers,
            feedback,
            shuffle,
            default_grade: scoring.default_grade(kind),
        }))
    }

    fn rich(&mut self, elem: &Element) -> RichText {
        HtmlWriter::new(self.media).write(&elem.children)
    }
}

/// Answers of a `choices` element in document order, `true` when correct.
///
/// LaTeXML may wrap them in paragraphs, so the whole subtree is searched,
/// stopping at answers and nested questions.
fn find_options(choices: &Element) -> Vec<(bool, &Element)> {
    fn walk<'a>(elem: &'a Element, found: &mut Vec<(bool, &'a Element)>) {
        for child in elem.children_elements() {
            match child.local_name() {
                "correctchoice" => found.push((true, child)),
                "wrongchoice" => found.push((false, child)),
                "question" => {}
                _ => walk(child, found),
            }
        }
    }
    let mut found = Vec::new();
    walk(choices, &mut found);
    found
}

/// First descendant named `local`, not looking inside answer lists.
fn find_outside_choices<'a>(elem: &'a Element, local: &str) -> Option<&'a Element> {
    find_all_outside_choices(elem, local).into_iter().next()
}

/// Every descendant named `local`, not looking inside answer lists.
fn find_all_outside_choices<'a>(elem: &'a Element, local: &str) -> Vec<&'a Element> {
    fn walk<'a>(elem: &'a Element, local: &str, found: &mut Vec<&'a Element>) {
        for child in elem.children_elements() {
            if child.is(local) {
                found.push(child);
            } else if !child.is("choices") {
                walk(child, local, found);
            }
        }
    }
    let mut found = Vec::new();
    walk(elem, local, &mut found);
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{ParseConfig, parse_str};
    use crate::runner::SystemRunner;

    const SAMPLE: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/quiz.latexml.xml"));

    fn run(xml: &str, category: &str) -> ConvertResult<Extraction> {
        let doc = parse_str(xml, "<memory>", ParseConfig::MIXED).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut media = MediaStore::new(dir.path(), dir.path(), None, &SystemRunner);
        extract(&doc, category, Path::new("quiz.tex"), &mut media)
    }

    #[test]
    fn test_sample_categories() {
        let extraction = run(SAMPLE, "quiz.tex").unwrap();
        let paths: Vec<&str> = extraction.quiz.categories.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, ["$course$/quiz.tex", "$course$/quiz.tex/geometry"]);
        assert_eq!(extraction.quiz.question_count(), 3);
        assert_eq!(extraction.skipped.len(), 1);
        assert!(extraction.skipped[0].starts_with("broken:"));
    }

    #[test]
    fn test_sample_single_question() {
        let extraction = run(SAMPLE, "quiz.tex").unwrap();
        let q = &extraction.quiz.categories[0].questions[0];
        assert_eq!(q.name, "prime");
        assert_eq!(q.kind, QuestionKind::Single);
        assert!(q.shuffle);
        assert_eq!(q.text.html, "<p>Which number is prime?</p>");
        assert_eq!(q.answers.len(), 3);
        assert_eq!(q.answers[0].text.html, "7");
        assert!(q.answers[0].correct);
        assert_eq!(q.answers[0].fraction, 100.0);
        assert_eq!(q.answers[1].fraction, -50.0);
        assert_eq!(q.feedback.as_ref().map(|f| f.html.as_str()), Some("7 has no divisor but 1 and itself."));
        assert_eq!(q.default_grade, 2.0);
    }

    #[test]
    fn test_sample_multiple_question() {
        let extraction = run(SAMPLE, "quiz.tex").unwrap();
        let geometry = &extraction.quiz.categories[1];
        let q = &geometry.questions[0];
        assert_eq!(q.kind, QuestionKind::Multiple);
        assert!(!q.shuffle);
        let fractions: Vec<f64> = q.answers.iter().map(|a| a.fraction).collect();
        assert_eq!(fractions, [50.0, 50.0, -100.0]);
        assert!(q.text.html.contains("\\(90^\\circ\\)"));
        assert_eq!(q.feedback, None);
    }

    #[test]
    fn test_anonymous_question_and_base_category() {
        let xml = r#"<document><question type="single"><p>Q</p><choices><correctchoice>a</correctchoice><wrongchoice>b</wrongchoice></choices></question></document>"#;
        let extraction = run(xml, "Algebra").unwrap();
        let category = &extraction.quiz.categories[0];
        assert_eq!(category.path, "$course$/Algebra");
        assert_eq!(category.questions[0].name, "question-1");
    }

    #[test]
    fn test_skip_reasons() {
        let xml = r#"<document>
            <question name="nochoice" type="single"><p>Q</p></question>
            <question name="twocorrect" type="single"><choices><correctchoice>a</correctchoice><correctchoice>b</correctchoice></choices></question>
            <question name="ok" type="multiple"><choices><correctchoice>a</correctchoice></choices></question>
        </document>"#;
        let extraction = run(xml, "c").unwrap();
        assert_eq!(extraction.quiz.question_count(), 1);
        assert_eq!(extraction.skipped.len(), 2);
        assert!(extraction.skipped[0].starts_with("nochoice: no choices"));
    }

    #[test]
    fn test_empty_quiz_and_bad_scoring() {
        let err = run("<document><p>nothing</p></document>", "c").unwrap_err();
        assert!(matches!(err, ConvertError::EmptyQuiz(_)));

        let xml = r#"<document><question name="q"><scoring value="b=one"/><choices><correctchoice>a</correctchoice></choices></question></document>"#;
        assert!(matches!(run(xml, "c"), Err(ConvertError::Scoring { .. })));
    }

    #[test]
    fn test_document_scoring_defaults() {
        let xml = r#"<document>
            <scoring default="single" value="b=1,m=-0.5"/>
            <scoring default="multiple" value="m=-1"/>
            <question name="s" type="single"><choices><correctchoice>a</correctchoice><wrongchoice>b</wrongchoice></choices></question>
            <question name="own" type="single"><scoring value="m=-1"/><choices><correctchoice>a</correctchoice><wrongchoice>b</wrongchoice></choices></question>
            <question name="m" type="multiple"><choices><correctchoice>a</correctchoice><correctchoice>b</correctchoice><wrongchoice>c</wrongchoice></choices></question>
        </document>"#;
        let extraction = run(xml, "c").unwrap();
        let questions = &extraction.quiz.categories[0].questions;
        assert_eq!(questions[0].answers[1].fraction, -50.0);
        // The question's own directive wins over the default
        assert_eq!(questions[1].answers[1].fraction, -100.0);
        assert_eq!(questions[2].answers[2].fraction, -50.0);
    }

    #[test]
    fn test_choices_wrapped_in_paragraphs() {
        let xml = r#"<document><question name="q" type="single"><choices><para><p><correctchoice>a</correctchoice></p></para><para><p><wrongchoice>b</wrongchoice></p></para></choices></question></document>"#;
        let extraction = run(xml, "c").unwrap();
        let answers = &extraction.quiz.categories[0].questions[0].answers;
        assert_eq!(answers.len(), 2);
        assert!(answers[0].correct && !answers[1].correct);
        assert_eq!(answers[1].text.html, "b");
    }

    #[test]
    fn test_too_many_correct_answers_skipped() {
        let many = |n: usize| {
            let correct = "<correctchoice>x</correctchoice>".repeat(n);
            format!(r#"<question name="q{n}" type="multiple"><choices>{correct}<wrongchoice>w</wrongchoice></choices></question>"#)
        };
        let xml = format!("<document>{}{}{}</document>", many(10), many(11), many(12));
        let extraction = run(&xml, "c").unwrap();
        assert_eq!(extraction.quiz.question_count(), 1);
        assert_eq!(extraction.quiz.categories[0].questions[0].name, "q10");
        assert_eq!(extraction.skipped.len(), 2);
        assert!(extraction.skipped[0].starts_with("q11: "));
    }
}
