// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
#[allow(dead_code)]
pub fn generate_map_content(branches: usize, depth: usize) -> String {
    let mut content = String::from("Mind Map generated by benchmark\n> __version__=\"1.1\"\n---\n# Root\n");
    for branch in 0..branches {
        generate_branch(&mut content, branch, 2, depth);
    }
    content
}

#[allow(dead_code)]
fn generate_branch(content: &mut String, index: usize, level: usize, depth: usize) {
    if level > depth + 1 {
        return;
    }

    content.push_str(&format!("{} Topic {index} at level {level}\n", "#".repeat(level)));
    content.push_str("> fillColor=\"#FFCC00\", leftSide=\"true\"\n");

    if index % 2 == 0 {
        content.push_str("- NOTE\n```\nA note with ``inline`` ticks\nover two lines\n```\n");
    }
    if index % 3 == 0 {
        content.push_str("- LINK\n```\nhttps://example.com/page?id=42\n```\n");
    }
    if level % 3 == 0 {
        content.push_str("```Java\nint value = 42;\n```\n");
    }

    for child in 0..2 {
        generate_branch(content, index * 2 + child, level + 1, depth);
    }
}
