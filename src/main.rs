use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use folio::config::Config;
use folio::export::{check_size, export_file_name};
use folio::format::format_file_size;
use folio::logging;
use folio::store::{
    parse_tag_list, CollectionStore, PhotoId, PhotoPatch, SqliteStorage, SystemClock, UuidIds,
};
use folio::upload::{discover_images, upload_batch, UploadFile, UploadReport};
use folio::view::{project, GalleryView, SortKey};
use folio::viewer::{download_name, Viewer};

enum Command {
    List {
        category: Option<String>,
        search: Option<String>,
        tags: Vec<String>,
        sort: Option<SortKey>,
        page: usize,
    },
    Show(String),
    Add {
        paths: Vec<PathBuf>,
        title: Option<String>,
        tags: Option<String>,
        category: Option<String>,
        compress: bool,
    },
    Edit {
        id: String,
        title: Option<String>,
        tags: Option<String>,
        category: Option<String>,
    },
    Favorite(String),
    Delete(String),
    Tags,
    Categories,
    AddCategory(String),
    Export(Option<PathBuf>),
    Import(PathBuf),
    Samples,
}

struct Args {
    config_path: Option<PathBuf>,
    command: Command,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;
    let mut rest = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("folio {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                config_path = Some(PathBuf::from(value_for(&args, i)));
                i += 1;
            }
            _ => rest.push(args[i].clone()),
        }
        i += 1;
    }

    match parse_command(&rest) {
        Ok(command) => Args {
            config_path,
            command,
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    }
}

fn value_for(args: &[String], i: usize) -> String {
    match args.get(i + 1) {
        Some(value) => value.clone(),
        None => {
            eprintln!("Error: {} requires an argument", args[i]);
            std::process::exit(1);
        }
    }
}

fn parse_command(args: &[String]) -> Result<Command> {
    let Some(name) = args.first() else {
        return Ok(Command::List {
            category: None,
            search: None,
            tags: Vec::new(),
            sort: None,
            page: 1,
        });
    };

    let mut positional = Vec::new();
    let mut category = None;
    let mut search = None;
    let mut tags = Vec::new();
    let mut tag_list = None;
    let mut sort = None;
    let mut page = 1;
    let mut title = None;
    let mut compress = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--category" => {
                category = Some(value_for(args, i));
                i += 1;
            }
            "--search" => {
                search = Some(value_for(args, i));
                i += 1;
            }
            "--tag" => {
                tags.push(value_for(args, i));
                i += 1;
            }
            "--tags" => {
                tag_list = Some(value_for(args, i));
                i += 1;
            }
            "--sort" => {
                let value = value_for(args, i);
                sort = Some(value.parse::<SortKey>().map_err(anyhow::Error::msg)?);
                i += 1;
            }
            "--page" => {
                page = value_for(args, i)
                    .parse()
                    .context("--page expects a number")?;
                i += 1;
            }
            "--title" => {
                title = Some(value_for(args, i));
                i += 1;
            }
            "--compress" => compress = true,
            other if other.starts_with("--") => bail!("Unknown option: {}", other),
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let one = |what: &str| -> Result<String> {
        match positional.as_slice() {
            [value] => Ok(value.clone()),
            _ => bail!("{} expects exactly one {}", name, what),
        }
    };

    let command = match name.as_str() {
        "list" => Command::List {
            category,
            search,
            tags,
            sort,
            page,
        },
        "show" => Command::Show(one("photo id")?),
        "add" => {
            if positional.is_empty() {
                bail!("add expects at least one path");
            }
            Command::Add {
                paths: positional.iter().map(PathBuf::from).collect(),
                title,
                tags: tag_list,
                category,
                compress,
            }
        }
        "edit" => Command::Edit {
            id: one("photo id")?,
            title,
            tags: tag_list,
            category,
        },
        "favorite" => Command::Favorite(one("photo id")?),
        "delete" => Command::Delete(one("photo id")?),
        "tags" => Command::Tags,
        "categories" => Command::Categories,
        "add-category" => Command::AddCategory(one("category name")?),
        "export" => Command::Export(positional.first().map(PathBuf::from)),
        "import" => Command::Import(PathBuf::from(one("file")?)),
        "samples" => Command::Samples,
        other => bail!("Unknown command: {}", other),
    };

    Ok(command)
}

fn print_help() {
    println!(
        r#"folio - local photo gallery

USAGE:
    folio [OPTIONS] [COMMAND] [ARGS]

COMMANDS:
    list                List photos (default)
        --category NAME     all, recent, favorites or a category name
        --search TEXT       Match title, name, tags or category
        --tag TAG           Show photos with this tag (repeatable)
        --sort KEY          uploadDate-desc, uploadDate-asc, title-asc,
                            title-desc, size-desc, size-asc
        --page N            Show the first N pages
    show ID             Show one photo and its neighbours
    add PATH...         Add image files or directories
        --title TEXT  --tags a,b  --category NAME  --compress
    edit ID             Change --title, --tags or --category
    favorite ID         Toggle favorite
    delete ID           Delete a photo
    tags                List all tags
    categories          List categories
    add-category NAME   Add a category
    export [PATH]       Write the collection as JSON
    import PATH         Replace photos from a JSON export
    samples             Add the sample photos

OPTIONS:
    --config, -c PATH   Path to config file
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    FOLIO_CONFIG        Path to config file (overrides default location)
    FOLIO_LOG           Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/folio/config.toml"#
    );
}

fn main() -> Result<()> {
    let args = parse_args();

    let config = match args.config_path {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };

    if let Err(e) = logging::init(&config) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    let storage = SqliteStorage::open(&config.db_path)?;
    let mut store = CollectionStore::open(
        Box::new(storage),
        Box::new(SystemClock),
        Box::new(UuidIds),
        config.store_options(),
    );

    run(args.command, &config, &mut store)
}

fn run(command: Command, config: &Config, store: &mut CollectionStore) -> Result<()> {
    match command {
        Command::List {
            category,
            search,
            tags,
            sort,
            page,
        } => {
            let mut view = GalleryView::new(config.gallery.page_size, config.gallery.default_sort);
            if let Some(category) = category {
                view.select_category(category);
            }
            if let Some(search) = search {
                view.set_search(&search);
            }
            for tag in &tags {
                view.toggle_tag(tag);
            }
            if let Some(sort) = sort {
                view.set_sort(sort);
            }

            let now = store.now();
            view.render(store, now);
            for _ in 1..page {
                if !view.load_more(store, now) {
                    break;
                }
            }

            let page = view.render(store, now);
            for photo in &page.photos {
                println!(
                    "{}{}  {}  [{}]  {}  {}",
                    if photo.favorite { "* " } else { "  " },
                    photo.id,
                    photo.display_title(),
                    photo.category,
                    format_file_size(photo.byte_size),
                    photo.upload_timestamp.format("%Y-%m-%d"),
                );
            }
            println!("{}", page.status());
            if page.has_more {
                println!("More available: --page {}", view.pagination().current_page() + 1);
            }
        }
        Command::Show(id) => {
            let id = PhotoId::new(id);
            let view = GalleryView::new(config.gallery.page_size, config.gallery.default_sort);
            let sequence = project(store.photos(), view.spec(), store.now())
                .into_iter()
                .map(|p| p.id.clone())
                .collect();

            let mut viewer = Viewer::new();
            if !viewer.open(&id, sequence) {
                bail!("Photo not found: {}", id);
            }
            let photo = store
                .get(&id)
                .with_context(|| format!("Photo not found: {}", id))?;
            let (position, total) = viewer.position();

            println!("{} ({} of {})", photo.display_title(), position, total);
            println!("  id:        {}", photo.id);
            println!("  file:      {} ({})", photo.name, photo.mime_type);
            println!("  size:      {}", format_file_size(photo.byte_size));
            println!(
                "  dimensions: {}x{}",
                photo.metadata.width, photo.metadata.height
            );
            println!("  uploaded:  {}", photo.upload_timestamp.to_rfc3339());
            println!("  category:  {}", photo.category);
            println!("  tags:      {}", photo.tags.join(", "));
            println!("  favorite:  {}", photo.favorite);
            println!("  download:  {}", download_name(photo));

            if total > 1 {
                viewer.previous();
                let previous = viewer.current().cloned();
                viewer.navigate(2);
                let next = viewer.current().cloned();
                if let (Some(previous), Some(next)) = (previous, next) {
                    println!("  previous:  {}", previous);
                    println!("  next:      {}", next);
                }
            }
        }
        Command::Add {
            paths,
            title,
            tags,
            category,
            compress,
        } => {
            let mut files = Vec::new();
            for path in &paths {
                for image in discover_images(path, &config.upload.image_extensions)? {
                    files.push(UploadFile::from_path(&image)?);
                }
            }
            if files.is_empty() {
                bail!("No images found");
            }

            let mut options = config.upload_options();
            options.title = title;
            options.tags = tags.as_deref().map(parse_tag_list).unwrap_or_default();
            options.category = category;
            options.compress |= compress;

            match upload_batch(store, &config.processor(), files, &options) {
                Ok(report) => print_upload_report(&report),
                Err(aborted) => {
                    print_upload_report(&aborted.report);
                    return Err(aborted.into());
                }
            }
        }
        Command::Edit {
            id,
            title,
            tags,
            category,
        } => {
            let mut patch = PhotoPatch::new();
            if let Some(title) = title {
                patch = patch.title(title);
            }
            if let Some(tags) = tags {
                patch = patch.tags(parse_tag_list(&tags));
            }
            if let Some(category) = category {
                patch = patch.category(category);
            }
            if patch.is_empty() {
                bail!("Nothing to change: pass --title, --tags or --category");
            }

            let photo = store.update(&PhotoId::new(id), patch)?;
            println!("Updated {}", photo.id);
        }
        Command::Favorite(id) => {
            let favorite = store.toggle_favorite(&PhotoId::new(id.as_str()))?;
            println!(
                "{} {}",
                id,
                if favorite { "added to favorites" } else { "removed from favorites" }
            );
        }
        Command::Delete(id) => {
            if store.delete(&PhotoId::new(id.as_str()))? {
                println!("Deleted {}", id);
            } else {
                println!("No photo with id {}", id);
            }
        }
        Command::Tags => {
            let view = GalleryView::new(config.gallery.page_size, config.gallery.default_sort);
            for chip in folio::view::tag_index(store.photos(), view.spec()) {
                println!("{}", chip.tag);
            }
        }
        Command::Categories => {
            for category in store.categories() {
                println!("{}", category);
            }
        }
        Command::AddCategory(name) => {
            if store.add_category(&name)? {
                println!("Added category {}", name.trim());
            } else {
                println!("Category {} already exists", name.trim());
            }
        }
        Command::Export(path) => {
            let document = store.export_snapshot()?;
            let path = path.unwrap_or_else(|| PathBuf::from(export_file_name(store.now())));
            std::fs::write(&path, document)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Exported {} photos to {}", store.len(), path.display());
        }
        Command::Import(path) => {
            let size = std::fs::metadata(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?
                .len();
            check_size(size, config.import.max_bytes)?;

            let document = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let summary = store.import_snapshot(&document)?;
            println!(
                "Imported {} photos ({} skipped), {} new categories",
                summary.imported, summary.dropped, summary.categories_added
            );
        }
        Command::Samples => {
            let added = store.seed_samples()?;
            println!("Added {} sample photos", added);
        }
    }

    Ok(())
}

fn print_upload_report(report: &UploadReport) {
    for photo in &report.added {
        println!("Added {}  {}", photo.id, photo.name);
    }
    for failure in &report.failed {
        eprintln!("Failed {}: {}", failure.name, failure.error);
    }
}
