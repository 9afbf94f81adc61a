use std::path::PathBuf;

use clap::Args;

use crate::cli::OutputFormat;
use crate::core::component::Component;
use crate::core::multiset::HashMultiset;
use crate::core::types::SignatureKind;
use crate::parsing::manifest::parse_manifest_file;

#[derive(Args)]
pub struct CompareArgs {
    /// First unit manifest
    #[arg(required = true)]
    pub input_a: PathBuf,

    /// Second unit manifest
    #[arg(required = true)]
    pub input_b: PathBuf,

    /// Signature kind to compare
    #[arg(short, long, value_enum, default_value_t = SignatureKind::Code)]
    pub signature: SignatureKind,
}

/// Similarity of two signature multisets
#[derive(Debug, Clone)]
pub struct Comparison {
    pub size_a: usize,
    pub size_b: usize,
    pub shared: usize,
    /// Fraction of A found in B
    pub a_in_b: f64,
    /// Fraction of B found in A
    pub b_in_a: f64,
    pub jaccard: f64,
    pub identical: bool,
}

impl Comparison {
    #[must_use]
    pub fn calculate(a: &HashMultiset, b: &HashMultiset) -> Self {
        Self {
            size_a: a.size(),
            size_b: b.size(),
            shared: a.intersection_size(b),
            a_in_b: b.overlap_coefficient(a),
            b_in_a: a.overlap_coefficient(b),
            jaccard: a.jaccard(b),
            identical: a.multiset_equals(b),
        }
    }
}

pub fn run(args: CompareArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let a = parse_manifest_file(&args.input_a)?;
    if verbose {
        eprintln!("Input A: {} units in {} packages", a.len(), a.packages.len());
    }

    let b = parse_manifest_file(&args.input_b)?;
    if verbose {
        eprintln!("Input B: {} units in {} packages", b.len(), b.packages.len());
    }

    let comparison = Comparison::calculate(
        &a.hash_multiset(args.signature),
        &b.hash_multiset(args.signature),
    );
    let same_package = a.package_hash() == b.package_hash();

    match format {
        OutputFormat::Text => print_text_comparison(&args, &a, &b, &comparison, same_package),
        OutputFormat::Json => print_json_comparison(&args, &comparison, same_package)?,
        OutputFormat::Tsv => print_tsv_comparison(&comparison, same_package),
    }

    Ok(())
}

fn print_text_comparison(
    args: &CompareArgs,
    a: &Component,
    b: &Component,
    comparison: &Comparison,
    same_package: bool,
) {
    println!("Comparison Results ({} signatures)", args.signature);
    println!("{}", "=".repeat(60));

    println!("\nInput A: {}", args.input_a.display());
    println!("  Units: {}", a.len());
    println!("  Packages: {}", a.packages.len());

    println!("\nInput B: {}", args.input_b.display());
    println!("  Units: {}", b.len());
    println!("  Packages: {}", b.packages.len());

    println!("\nSimilarity:");
    println!("  Shared units: {}", comparison.shared);
    println!("  A found in B: {:.2}%", comparison.a_in_b * 100.0);
    println!("  B found in A: {:.2}%", comparison.b_in_a * 100.0);
    println!("  Jaccard: {:.2}%", comparison.jaccard * 100.0);
    println!("  Identical content: {}", comparison.identical);
    println!("  Same package identity: {same_package}");
}

fn print_json_comparison(
    args: &CompareArgs,
    comparison: &Comparison,
    same_package: bool,
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "input_a": {
            "path": args.input_a.display().to_string(),
            "size": comparison.size_a,
        },
        "input_b": {
            "path": args.input_b.display().to_string(),
            "size": comparison.size_b,
        },
        "signature": args.signature,
        "score": {
            "shared": comparison.shared,
            "a_in_b": comparison.a_in_b,
            "b_in_a": comparison.b_in_a,
            "jaccard": comparison.jaccard,
            "identical": comparison.identical,
            "same_package": same_package,
        }
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_comparison(comparison: &Comparison, same_package: bool) {
    println!("size_a\tsize_b\tshared\ta_in_b\tb_in_a\tjaccard\tidentical\tsame_package");
    println!(
        "{}\t{}\t{}\t{:.4}\t{:.4}\t{:.4}\t{}\t{}",
        comparison.size_a,
        comparison.size_b,
        comparison.shared,
        comparison.a_in_b,
        comparison.b_in_a,
        comparison.jaccard,
        comparison.identical,
        same_package,
    );
}
