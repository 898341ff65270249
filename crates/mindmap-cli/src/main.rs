use anyhow::{Context, Result};
use mindmap_config::Config;
use mindmap_engine::{Extra, ExtraKind, MindMap, TopicId, io};
use mindmap_syntax::SyntaxKind;
use relative_path::RelativePathBuf;
use std::path::{Path, PathBuf};
use std::{env, fs, process};

const USAGE: &str = "\
Usage:
  mmd check [FILE...]       parse maps (default: every map under maps_path)
  mmd fmt FILE [--write]    print or rewrite FILE in canonical form
  mmd tree FILE             show the topic outline with attributes and extras
  mmd links FILE            list jump links and file links with their targets";

enum Command {
    Check(Vec<PathBuf>),
    Fmt { file: PathBuf, write: bool },
    Tree(PathBuf),
    Links(PathBuf),
}

fn parse_args(args: &[String]) -> Option<Command> {
    let (command, rest) = args.split_first()?;
    match (command.as_str(), rest) {
        ("check", files) => Some(Command::Check(files.iter().map(PathBuf::from).collect())),
        ("fmt", [file]) => Some(Command::Fmt {
            file: PathBuf::from(file),
            write: false,
        }),
        ("fmt", [file, flag]) | ("fmt", [flag, file]) if flag == "--write" => Some(Command::Fmt {
            file: PathBuf::from(file),
            write: true,
        }),
        ("tree", [file]) => Some(Command::Tree(PathBuf::from(file))),
        ("links", [file]) => Some(Command::Links(PathBuf::from(file))),
        _ => None,
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = parse_args(&args) else {
        eprintln!("{USAGE}");
        process::exit(2);
    };

    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let ok = match command {
        Command::Check(files) => check(&config, files)?,
        Command::Fmt { file, write } => fmt(&config, &file, write)?,
        Command::Tree(file) => {
            print!("{}", render_tree(&load(&file)?));
            true
        }
        Command::Links(file) => {
            let base = file.parent().unwrap_or(Path::new("."));
            print!("{}", render_links(&load(&file)?, base));
            true
        }
    };

    if !ok {
        process::exit(1);
    }
    Ok(())
}

fn load(file: &Path) -> Result<MindMap> {
    io::read_map_file(file).with_context(|| format!("Failed to load {}", file.display()))
}

fn check(config: &Config, files: Vec<PathBuf>) -> Result<bool> {
    let files = if files.is_empty() {
        let Some(root) = &config.maps_path else {
            eprintln!("Error: No files given and no maps_path in {}", Config::config_path().display());
            eprintln!("{USAGE}");
            process::exit(2);
        };
        let found = io::scan_map_files(root)?;
        log::info!("Checking {} maps under {}", found.len(), root.display());
        found
            .into_iter()
            .filter(|file| !config.is_excluded(root, file))
            .collect()
    } else {
        files
    };

    let mut all_ok = true;
    for file in &files {
        let name = display_name(config, file);
        match fs::read_to_string(file) {
            Ok(content) => {
                let report = check_source(&content);
                all_ok &= report.is_empty();
                if report.is_empty() {
                    println!("{name}: ok");
                }
                for line in report {
                    println!("{name}: {line}");
                }
            }
            Err(e) => {
                all_ok = false;
                println!("{name}: {e}");
            }
        }
    }
    Ok(all_ok)
}

fn display_name(config: &Config, file: &Path) -> String {
    config
        .maps_path
        .as_deref()
        .and_then(|root| file.strip_prefix(root).ok())
        .and_then(|relative| RelativePathBuf::from_path(relative).ok())
        .map(|relative| relative.to_string())
        .unwrap_or_else(|| file.display().to_string())
}

/// Problems found in one map: the parse error first, then every
/// unrecognised line in the syntax tree. Empty when the map is fine.
fn check_source(content: &str) -> Vec<String> {
    let mut problems = Vec::new();
    if let Err(e) = MindMap::parse(content) {
        problems.push(e.to_string());
    }

    let tree = mindmap_syntax::parse(content);
    for node in tree.descendants().filter(|n| n.kind() == SyntaxKind::ERROR) {
        let offset = usize::from(node.text_range().start());
        let line = content[..offset].matches('\n').count() + 1;
        let text = node.text().to_string();
        let problem = format!("line {line}: unrecognised line {:?}", text.trim_end());
        // The parse error already names the first one.
        if !problems.contains(&problem) {
            problems.push(problem);
        }
    }
    problems
}

fn fmt(config: &Config, file: &Path, write: bool) -> Result<bool> {
    let content =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let map = MindMap::parse(&content).with_context(|| format!("Failed to parse {}", file.display()))?;
    let formatted = map.write_with(&config.format);

    if !write {
        print!("{formatted}");
    } else if formatted != content {
        fs::write(file, &formatted).with_context(|| format!("Failed to write {}", file.display()))?;
        log::info!("Reformatted {}", file.display());
    } else {
        log::info!("{} is already formatted", file.display());
    }
    Ok(true)
}

fn single_line(text: &str) -> String {
    text.replace("\r\n", " ⏎ ").replace('\n', " ⏎ ")
}

fn render_tree(map: &MindMap) -> String {
    let mut out = String::new();
    for id in map.iter() {
        let (Ok(level), Some(topic)) = (map.level(id), map.topic(id)) else {
            continue;
        };
        let indent = "  ".repeat(level);

        out.push_str(&indent);
        out.push_str(&single_line(topic.text()));
        if !topic.attributes().is_empty() {
            let attributes: Vec<String> = topic
                .attributes()
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            out.push_str(&format!("  {{{}}}", attributes.join(", ")));
        }
        out.push('\n');

        for extra in topic.extras() {
            out.push_str(&format!(
                "{indent}  - {}: {}\n",
                extra.kind(),
                single_line(&extra.content())
            ));
        }
        for (language, body) in topic.code_snippets() {
            out.push_str(&format!(
                "{indent}  - snippet {language}: {} lines\n",
                body.lines().count()
            ));
        }
    }
    out
}

fn title(map: &MindMap, id: TopicId) -> String {
    map.topic(id)
        .map(|topic| single_line(topic.text()))
        .unwrap_or_default()
}

fn render_links(map: &MindMap, base: &Path) -> String {
    let mut out = String::new();

    for id in map.find_all_topics_for_extra_kind(ExtraKind::Topic) {
        let Some(link @ Extra::Topic(uid)) = map.topic(id).and_then(|t| t.extra(ExtraKind::Topic))
        else {
            continue;
        };
        let target = match map.find_topic_for_link(link) {
            Some(target) => title(map, target),
            None => format!("dangling ({uid})"),
        };
        out.push_str(&format!("{} -> {target}\n", title(map, id)));
    }

    for id in map.find_all_topics_for_extra_kind(ExtraKind::File) {
        let Some(uri) = map
            .topic(id)
            .and_then(|t| t.extra(ExtraKind::File))
            .and_then(Extra::as_uri)
        else {
            continue;
        };
        let target = match uri.to_file_path(base) {
            Some(path) if path.exists() => format!("file {}", path.display()),
            Some(path) => format!("file {} (missing)", path.display()),
            None => format!("file {uri} (not a local path)"),
        };
        out.push_str(&format!("{} -> {target}\n", title(map, id)));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        assert!(matches!(
            parse_args(&args(&["check"])),
            Some(Command::Check(files)) if files.is_empty()
        ));
        assert!(matches!(
            parse_args(&args(&["fmt", "--write", "a.mmd"])),
            Some(Command::Fmt { write: true, .. })
        ));
        assert!(matches!(
            parse_args(&args(&["fmt", "a.mmd"])),
            Some(Command::Fmt { write: false, .. })
        ));
        assert!(parse_args(&args(&["tree"])).is_none());
        assert!(parse_args(&args(&["fmt", "a.mmd", "--force"])).is_none());
        assert!(parse_args(&args(&[])).is_none());
    }

    #[test]
    fn test_check_clean_map() {
        assert!(check_source("---\n# Root\n## Child\n").is_empty());
    }

    #[test]
    fn test_check_reports_every_unknown_line() {
        let problems = check_source("---\n# Root\noops\n## Child\nagain\n");
        assert_eq!(
            problems,
            vec![
                "line 3: unrecognised line \"oops\"".to_string(),
                "line 5: unrecognised line \"again\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_check_reports_structure_errors() {
        let problems = check_source("---\n# A\n### B\n");
        assert_eq!(
            problems,
            vec!["line 3: topic of depth 3 where at most 2 is allowed".to_string()]
        );
    }

    #[test]
    fn test_render_tree() {
        let map = MindMap::parse(
            "---\n# Root\n> fillColor=\"#FFF\"\n- NOTE\n```\nfirst\nsecond\n```\n## Child<br/>two\n```Java\na;\nb;\n```\n",
        )
        .unwrap();
        assert_eq!(
            render_tree(&map),
            "Root  {fillColor=#FFF}\n  - NOTE: first ⏎ second\n  Child ⏎ two\n    - snippet Java: 2 lines\n"
        );
    }

    #[test]
    fn test_render_links() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("present.txt"), "").unwrap();

        let map = MindMap::parse(
            "---\n# Root\n> topicLinkUID=\"AAA\"\n## To root\n- TOPIC\n```\nAAA\n```\n## Dangling\n- TOPIC\n```\nBBB\n```\n## Present\n- FILE\n```\npresent.txt\n```\n## Missing\n- FILE\n```\nmissing.txt\n```\n",
        )
        .unwrap();

        let rendered = render_links(&map, dir.path());
        let expected = format!(
            "To root -> Root\nDangling -> dangling (BBB)\nPresent -> file {}\nMissing -> file {} (missing)\n",
            dir.path().join("present.txt").display(),
            dir.path().join("missing.txt").display(),
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_fmt_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("map.mmd");
        fs::write(&file, "Header\n--\n# Root\n> a='1'\n").unwrap();

        fmt(&Config::default(), &file, true).unwrap();

        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "---\n# Root\n> a=\"1\"\n"
        );
    }
}
