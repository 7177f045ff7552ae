use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let kinds = ["performer", "scene", "gallery", "movie"];

    let mut cmd = clap::Command::new("mapscrape")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Mapscrape Contributors")
        .about("Scrape metadata with JSON and HTML mapped scrapers")
        .subcommand_required(true)
        .arg(
            clap::arg!(--"config-dir" <DIR> "Scraper definition directory")
                .global(true)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(-s --scraper <ID> "Scraper id (definition file stem)").global(true))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .global(true)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(-v --verbose "Enable debug logging").global(true))
        .subcommand(clap::Command::new("list").about("List loaded scrapers and the lookups they support"))
        .subcommand(
            clap::Command::new("url")
                .about("Scrape a record from a URL or local file")
                .arg(clap::arg!(<KIND> "Record kind to scrape").value_parser(kinds))
                .arg(clap::arg!(<URL> "URL or local path of the document")),
        )
        .subcommand(
            clap::Command::new("search")
                .about("Search performers by name")
                .arg(clap::arg!(<NAME> "Name to search for")),
        )
        .subcommand(
            clap::Command::new("fragment")
                .about("Re-scrape a stored scene or gallery")
                .arg(clap::arg!(<KIND> "Record kind of the stored entity").value_parser(["scene", "gallery"]))
                .arg(clap::arg!(--id <ID> "Id of the stored entity").required(true))
                .arg(
                    clap::arg!(--store <FILE> "JSON file with stored scenes and galleries")
                        .required(true)
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            clap::Command::new("completions")
                .about("Generate shell completion script")
                .arg(clap::arg!(<SHELL> "Target shell").value_parser(["bash", "zsh", "fish", "powershell", "elvish"])),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "mapscrape", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "mapscrape", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "mapscrape", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "mapscrape", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
