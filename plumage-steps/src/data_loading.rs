use {
    std::{
        fs::{self, File, OpenOptions},
        io::{prelude::*, BufReader, BufWriter},
    },
    anyhow::Context,
    tracing::{info, warn},
    indicatif::ProgressBar,
    serde::Deserialize,
    plumage_core::{
        aspects::PriorTables,
        classifier::Label,
        error::PlumageError,
        models::{ClassifiedItem, Item, ItemRecord},
        report::{ReportRow, Reporter},
    },
    crate::progress::Progress,
};

/// One line of a reference corpus file: `{"label": "Positive", "tokens": [...]}`.
#[derive(Deserialize, Debug)]
pub struct ReferenceEntry {
    pub label: Label,
    pub tokens: Vec<String>,
}

fn open_input(what: &str, path: &str) -> anyhow::Result<File> {
    File::open(path).map_err(|err| PlumageError::MissingInput {
        what: what.to_owned(),
        path: format!("{} ({})", path, err),
    }.into())
}

fn create_output(path: &str) -> anyhow::Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("failed to create {}", path))?;

    Ok(BufWriter::new(file))
}

/// Output written beside its destination, moved into place by `commit`.
struct Staged {
    path: String,
    staging_path: String,
}

impl Staged {
    fn write<F>(path: &str, write: F) -> anyhow::Result<Self>
    where
        F: FnOnce(&mut BufWriter<File>) -> anyhow::Result<()>,
    {
        let staged = Self {
            path: path.to_owned(),
            staging_path: format!("{}.partial", path),
        };

        let written = create_output(&staged.staging_path)
            .and_then(|mut file| {
                write(&mut file)?;
                file.flush()?;
                Ok(())
            });

        match written {
            Ok(()) => Ok(staged),
            Err(err) => {
                staged.discard();
                Err(err)
            }
        }
    }

    fn commit(self) -> anyhow::Result<()> {
        fs::rename(&self.staging_path, &self.path)
            .with_context(|| format!("failed to move {} into place", self.path))
    }

    fn discard(self) {
        let _ = fs::remove_file(&self.staging_path);
    }
}

/// Reads headerless 18-column item rows, stopping after `max_items` rows.
/// Rows that do not parse are logged and skipped.
pub fn load_items(path: &str, max_items: Option<usize>) -> anyhow::Result<Vec<Item>> {
    info!("loading items from {}", path);
    read_items(open_input("items", path)?, max_items)
}

pub fn read_items<R: Read>(reader: R, max_items: Option<usize>) -> anyhow::Result<Vec<Item>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let records: Vec<_> = reader.records()
        .take(max_items.unwrap_or(usize::MAX))
        .collect();

    let pb = ProgressBar::new(records.len() as u64);

    let mut items = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for (index, record) in records.into_iter().enumerate() {
        pb.inc(1);

        let parsed = record
            .map_err(|err| PlumageError::MalformedRecord { index, reason: err.to_string() })
            .and_then(|record| record.deserialize::<ItemRecord>(None)
                .map_err(|err| PlumageError::MalformedRecord { index, reason: err.to_string() }))
            .and_then(|record| record.into_item(index));

        match parsed {
            Ok(item) => items.push(item),
            Err(err) => {
                warn!("skipping item: {}", err);
                skipped += 1;
            }
        }
    }

    pb.finish();
    info!("loaded {} items, skipped {} malformed rows", items.len(), skipped);

    Ok(items)
}

/// Saves surviving items and prior tables together. Both files are staged
/// first and neither destination is touched unless both were written.
pub fn save_mined(items_path: &str, items: &[ClassifiedItem], priors_path: &str, priors: &PriorTables) -> anyhow::Result<()> {
    let staged_items = Staged::write(items_path, |file| write_classified_items(file, items))
        .context("saving classified items")?;

    let staged_priors = match Staged::write(priors_path, |file| write_priors(file, priors)) {
        Ok(v) => v,
        Err(err) => {
            staged_items.discard();
            return Err(err.context("saving prior tables"));
        }
    };

    staged_items.commit()?;
    staged_priors.commit()?;

    info!("saved {} classified items to {} and prior tables up to n = {} to {}", items.len(), items_path, priors.max_n(), priors_path);
    Ok(())
}

fn write_classified_items<W: Write>(writer: &mut W, items: &[ClassifiedItem]) -> anyhow::Result<()> {
    let mut progress = Progress::new("saving classified items");

    for item in items {
        writeln!(writer, "{}", serde_json::to_string(item)?)?;
        progress.update();
    }

    progress.finish();
    Ok(())
}

fn write_priors<W: Write>(writer: &mut W, priors: &PriorTables) -> anyhow::Result<()> {
    serde_json::to_writer(writer, priors)?;
    Ok(())
}

pub fn load_classified_items(path: &str) -> anyhow::Result<Vec<ClassifiedItem>> {
    info!("loading classified items from {}", path);
    read_classified_items(open_input("classified items", path)?)
}

pub fn read_classified_items<R: Read>(reader: R) -> anyhow::Result<Vec<ClassifiedItem>> {
    let mut items = Vec::new();
    let mut skipped = 0;

    // lines are parsed as bytes so a badly encoded line is skipped like any other
    for (index, line) in BufReader::new(reader).split(b'\n').enumerate() {
        let line = line?;
        if line.iter().all(|byte| byte.is_ascii_whitespace()) {
            continue;
        }

        match serde_json::from_slice(&line) {
            Ok(item) => items.push(item),
            Err(err) => {
                warn!("skipping classified item: {}", PlumageError::MalformedRecord { index, reason: err.to_string() });
                skipped += 1;
            }
        }
    }

    info!("loaded {} classified items, skipped {}", items.len(), skipped);
    Ok(items)
}

pub fn load_priors(path: &str) -> anyhow::Result<PriorTables> {
    let priors: PriorTables = serde_json::from_reader(BufReader::new(open_input("prior tables", path)?))?;
    if priors.is_empty() {
        warn!("prior tables in {} are empty, every rate will be undefined", path);
    }

    Ok(priors)
}

pub fn load_reference_corpus(path: &str) -> anyhow::Result<Vec<(Label, Vec<String>)>> {
    info!("loading reference corpus from {}", path);
    read_reference_corpus(open_input("reference corpus", path)?)
}

pub fn read_reference_corpus<R: Read>(reader: R) -> anyhow::Result<Vec<(Label, Vec<String>)>> {
    let mut corpus = Vec::new();

    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let entry: ReferenceEntry = serde_json::from_str(&line)
            .map_err(|err| PlumageError::MalformedRecord { index, reason: err.to_string() })?;
        corpus.push((entry.label, entry.tokens));
    }

    Ok(corpus)
}

/// One word per line; blank lines and `#` comments are ignored.
pub fn load_stopwords(path: &str) -> anyhow::Result<Vec<String>> {
    read_stopwords(open_input("stopwords", path)?)
}

pub fn read_stopwords<R: Read>(reader: R) -> anyhow::Result<Vec<String>> {
    let mut words = Vec::new();

    for line in BufReader::new(reader).lines() {
        let line = line?;
        let word = line.trim();
        if !word.is_empty() && !word.starts_with('#') {
            words.push(word.to_owned());
        }
    }

    Ok(words)
}

pub fn save_report(path: &str, reporter: &Reporter, rows: &[ReportRow]) -> anyhow::Result<()> {
    reporter.write_csv(rows, create_output(path)?)?;
    info!("exported {} report rows to {}", rows.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        std::{env, path::PathBuf},
        plumage_core::classifier::Scores,
        super::*,
    };

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("plumage-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn classified(id: &str, positivity: f64) -> ClassifiedItem {
        Item::new(id, vec!["love".to_owned()]).classified(Scores {
            positivity,
            negativity: 1.0 - positivity,
        })
    }

    fn row(id: &str, tokens: &str) -> String {
        let mut fields = vec![String::new(); 16];
        fields[3] = id.to_owned();
        fields.push("cleaned text".to_owned());
        fields.push(tokens.to_owned());

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(vec![]);
        writer.write_record(&fields).unwrap();
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn reads_positional_item_rows_and_skips_malformed() {
        let input = [
            row("1", r#"["i","love","this"]"#),
            row("2", "not json"),
            "too,few,columns\n".to_owned(),
            row("3", r#"["great"]"#),
        ].concat();

        let items = read_items(input.as_bytes(), None).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "1");
        assert_eq!(items[0].tokens, vec!["i", "love", "this"]);
        assert_eq!(items[1].record.cleaned_text, "cleaned text");
    }

    #[test]
    fn stops_after_max_items() {
        let input = [row("1", "[]"), row("2", "[]"), row("3", "[]")].concat();

        let items = read_items(input.as_bytes(), Some(2)).unwrap();

        assert_eq!(items.iter().map(|item| item.id.as_str()).collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn classified_item_lines_round_trip_with_scores() {
        let item = Item::new("7", vec!["love".to_owned()]).classified(Scores {
            positivity: 0.8,
            negativity: 0.2,
        });

        let mut input = serde_json::to_string(&item).unwrap();
        input.push_str("\n\n{broken\n");

        let items = read_classified_items(input.as_bytes()).unwrap();

        assert_eq!(items, vec![item]);
    }

    #[test]
    fn badly_encoded_classified_item_line_is_skipped() {
        let mut input = Vec::new();
        writeln!(input, "{}", serde_json::to_string(&classified("1", 0.9)).unwrap()).unwrap();
        input.extend_from_slice(b"\xff\xfe\n");
        writeln!(input, "{}", serde_json::to_string(&classified("2", 0.1)).unwrap()).unwrap();

        let items = read_classified_items(input.as_slice()).unwrap();

        assert_eq!(items.iter().map(|item| item.id.as_str()).collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn saves_items_and_priors_together() {
        let dir = scratch_dir("saved");
        let items_path = dir.join("_tweets").to_string_lossy().to_string();
        let priors_path = dir.join("_grams").to_string_lossy().to_string();
        let items = vec![classified("1", 0.9), classified("2", 0.05)];

        save_mined(&items_path, &items, &priors_path, &PriorTables::default()).unwrap();

        assert_eq!(load_classified_items(&items_path).unwrap(), items);
        assert_eq!(load_priors(&priors_path).unwrap(), PriorTables::default());
        assert!(!PathBuf::from(format!("{}.partial", items_path)).exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn failed_priors_save_leaves_no_items_behind() {
        let dir = scratch_dir("unsaved");
        let items_path = dir.join("_tweets").to_string_lossy().to_string();
        let priors_path = dir.join("missing").join("_grams").to_string_lossy().to_string();

        let result = save_mined(&items_path, &[classified("1", 0.9)], &priors_path, &PriorTables::default());

        assert!(result.is_err());
        assert!(!PathBuf::from(&items_path).exists());
        assert!(!PathBuf::from(format!("{}.partial", items_path)).exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn reference_corpus_rejects_bad_lines() {
        let good = "{\"label\": \"Positive\", \"tokens\": [\"love\"]}\n{\"label\": \"Negative\", \"tokens\": [\"hate\"]}\n";
        let corpus = read_reference_corpus(good.as_bytes()).unwrap();
        assert_eq!(corpus, vec![
            (Label::Positive, vec!["love".to_owned()]),
            (Label::Negative, vec!["hate".to_owned()]),
        ]);

        let bad = "{\"label\": \"Neutral\", \"tokens\": []}\n";
        assert!(read_reference_corpus(bad.as_bytes()).is_err());
    }

    #[test]
    fn stopword_files_skip_comments_and_blanks() {
        let words = read_stopwords("# english\nthe\n\n  a  \n".as_bytes()).unwrap();

        assert_eq!(words, vec!["the", "a"]);
    }

    #[test]
    fn missing_input_is_reported_as_such() {
        let err = load_priors("/nonexistent/plumage/_grams").unwrap_err();

        match err.downcast_ref::<PlumageError>() {
            Some(PlumageError::MissingInput { what, .. }) => assert_eq!(what, "prior tables"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
