use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use coursefiles::files::license::LicenseRegistry;
use coursefiles::files::{Context, CourseFiles, FileIndex, TracingEventSink};
use coursefiles::strings::{StringCatalog, Translator};
use coursefiles::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// List, filter and relicense the files of a course.
#[derive(Parser, Debug)]
#[command(name = "coursefiles", version, about)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Metadata database, overriding the config
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the metadata tables if they do not exist
    Init,

    /// List the files of a course
    List {
        #[arg(long)]
        course: i64,
        /// Restrict to a context below the course instead of the whole course
        #[arg(long)]
        context: Option<i64>,
        /// Component key, `all` or `all_wo_submissions`
        #[arg(long, default_value = "all")]
        component: String,
        /// File type: `all`, a category name, or `other`
        #[arg(long, default_value = "all")]
        filetype: String,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 100)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },

    /// Show the component filter options of a course
    Components {
        #[arg(long)]
        course: i64,
    },

    /// Show the licenses files may be given
    Licenses,

    /// Show the file type filter options
    FileTypes,

    /// Change the license of files of a course
    Relicense {
        #[arg(long)]
        course: i64,
        #[arg(long)]
        license: String,
        /// File ids, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<i64>,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("coursefiles=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let mut catalog = StringCatalog::with_defaults();
    catalog.extend(&config.strings);
    let strings: Arc<dyn Translator> = Arc::new(catalog);
    let licenses = Arc::new(LicenseRegistry::new(
        &config.licenses,
        &config.license_colors,
        strings.as_ref(),
    ));

    let db_path = cli.database.clone().unwrap_or_else(|| config.database_path());
    let app = App {
        config,
        strings,
        licenses,
        db_path,
    };

    match cli.command {
        Command::Init => {
            app.index()?;
            println!("Metadata store ready at {}", app.db_path.display());
        }
        Command::FileTypes => {
            for (key, label) in CourseFiles::get_file_types(app.strings.as_ref()) {
                println!("{key:<12} {label}");
            }
        }
        Command::Licenses => {
            for license in app.licenses.licenses() {
                let label = app.licenses.name_color(&license.shortname);
                let color = label.color.map(|c| format!("#{c}")).unwrap_or_default();
                println!("{:<20} {:<8} {}", license.shortname, color, license.fullname);
            }
        }
        Command::List {
            course,
            context,
            component,
            filetype,
            offset,
            limit,
            json,
        } => {
            let index = app.index()?;
            let mut files = match context {
                None => app.course_files(&index, course, &component, &filetype)?,
                Some(context_id) => {
                    let scope = list_scope(&index, course, context_id)?;
                    CourseFiles::new(
                        course,
                        scope,
                        &component,
                        &filetype,
                        index,
                        app.strings.clone(),
                        app.licenses.clone(),
                        Arc::new(TracingEventSink),
                    )
                }
            };
            print_list(&mut files, &app.config, offset, limit, json)?;
        }
        Command::Components { course } => {
            let index = app.index()?;
            let mut files = app.course_files(&index, course, "all", "all")?;
            for component in files.get_components()? {
                println!("{:<28} {}", component.key, component.label);
            }
        }
        Command::Relicense {
            course,
            license,
            ids,
            json,
        } => {
            let index = app.index()?;
            let files = app.course_files(&index, course, "all", "all")?;
            let outcome = files.set_files_license(ids, &license)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!(
                    "{} of {} files now have license {}",
                    outcome.updated.len(),
                    outcome.requested.len(),
                    license
                );
                let skipped: Vec<i64> = outcome
                    .requested
                    .iter()
                    .copied()
                    .filter(|id| !outcome.updated.contains(id))
                    .collect();
                if !skipped.is_empty() {
                    println!("Skipped (not in this course): {skipped:?}");
                }
            }
        }
    }

    Ok(())
}

struct App {
    config: Config,
    strings: Arc<dyn Translator>,
    licenses: Arc<LicenseRegistry>,
    db_path: PathBuf,
}

impl App {
    fn index(&self) -> Result<FileIndex> {
        FileIndex::open(&self.db_path)
    }

    fn course_files(
        &self,
        index: &FileIndex,
        course: i64,
        component: &str,
        filetype: &str,
    ) -> Result<CourseFiles> {
        CourseFiles::for_course(
            course,
            component,
            filetype,
            index.clone(),
            self.strings.clone(),
            self.licenses.clone(),
            Arc::new(TracingEventSink),
        )
        .with_context(|| format!("Cannot open course {course}"))
    }
}

/// Context `context_id`, provided it lies within the course.
fn list_scope(index: &FileIndex, course: i64, context_id: i64) -> Result<Context> {
    let course_context = index
        .course_context(course)?
        .with_context(|| format!("Unknown course {course}"))?;
    let scope = index
        .context(context_id)?
        .with_context(|| format!("Unknown context {context_id}"))?;
    anyhow::ensure!(
        course_context.contains(scope.id, &scope.path),
        "Context {context_id} is not part of course {course}"
    );
    Ok(scope)
}

fn print_list(
    files: &mut CourseFiles,
    config: &Config,
    offset: usize,
    limit: usize,
    json: bool,
) -> Result<()> {
    let page = files.get_file_list(offset, limit)?.clone();
    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    for file in &page.files {
        let kind = file
            .mimetype
            .as_deref()
            .map(|m| files.file_type_label(m))
            .unwrap_or_default();
        let license = file
            .license
            .as_deref()
            .map(|l| files.get_license_name_color(l).name)
            .unwrap_or_default();
        let link = files
            .get_file_download_url(file)
            .map(|p| config.absolute_url(&p))
            .unwrap_or_else(|| "-".to_string());
        let used = match files.is_file_used(file)? {
            Some(true) => "used",
            Some(false) => "unused",
            None => "",
        };
        println!(
            "{:>6}  {:<24} {:<32} {:<10} {:<28} {:<6} {}",
            file.id, file.component, file.filename, kind, license, used, link
        );
    }
    println!(
        "-- {} to {} of {} files",
        page.offset + usize::from(!page.files.is_empty()),
        page.offset + page.files.len(),
        files.get_file_list_total_size()?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursefiles::files::schema::{CONTEXT_COURSE, CONTEXT_MODULE};
    use tempfile::TempDir;

    fn context(id: i64, level: i64, instance_id: i64, path: &str) -> Context {
        Context {
            id,
            level,
            instance_id,
            path: path.to_string(),
        }
    }

    fn index() -> (TempDir, FileIndex) {
        let dir = TempDir::new().unwrap();
        let index = FileIndex::open(&dir.path().join("files.db")).unwrap();
        index.insert_context(&context(17, CONTEXT_COURSE, 4, "/1/17")).unwrap();
        index.insert_context(&context(40, CONTEXT_MODULE, 9, "/1/17/40")).unwrap();
        index.insert_context(&context(170, CONTEXT_COURSE, 5, "/1/170")).unwrap();
        (dir, index)
    }

    #[test]
    fn list_scope_accepts_contexts_inside_the_course() {
        let (_dir, index) = index();
        assert_eq!(list_scope(&index, 4, 40).unwrap().path, "/1/17/40");
        assert_eq!(list_scope(&index, 4, 17).unwrap().id, 17);
    }

    #[test]
    fn list_scope_rejects_foreign_and_unknown_contexts() {
        let (_dir, index) = index();
        assert!(list_scope(&index, 4, 170).is_err());
        assert!(list_scope(&index, 4, 999).is_err());
        assert!(list_scope(&index, 99, 40).is_err());
    }
}
