use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use curio::{find_catalog_root_from, Catalog, ConceptKind, ContentRef, EntityId, SchemaLocation};
use log::info;
use std::env::current_dir;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "curio")]
#[command(about = "Ontology-backed catalogue manager")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Verbose mode - sets the RUST_LOG level to info, defaults to warning level
    #[clap(long, short, action, default_value = "false", global = true)]
    verbose: bool,
    /// Debug mode - sets the RUST_LOG level to debug, defaults to warning level
    #[clap(long, action, default_value = "false", global = true)]
    debug: bool,
    /// Acting user, recorded as creator on records created by this invocation
    #[clap(long, short, global = true)]
    user: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a new catalogue in the current directory
    Init,
    /// Import an RDF/OWL schema document (file path or URL) into the catalogue
    Import {
        /// The location of the schema document
        location: String,
        /// Display name for the imported schema
        #[clap(long, short)]
        name: String,
    },
    /// Prints counts of everything in the catalogue
    Status,
    /// List all classes in the catalogue
    Classes,
    /// Print the ancestor chain of a class, leaf to root
    Ancestors {
        /// The identifier of the class
        identifier: String,
    },
    /// Print a class and all of its descendants
    Descendants {
        /// The identifier of the class
        identifier: String,
    },
    /// List the property types available to a class as subject
    Properties {
        /// The identifier of the class
        identifier: String,
    },
    /// List entity instances of a class or any of its descendants
    Entities {
        /// The identifier of the class
        identifier: String,
    },
    /// Create an entity of the given class
    AddEntity {
        /// Label for the new entity
        label: String,
        /// The identifier of the class the entity is an instance of
        #[clap(long, short)]
        class: String,
    },
    /// Register an external authority record and mirror it into the entity graph
    AddConcept {
        /// Label for the concept
        label: String,
        /// Kind of record: "authority" or "type"
        #[clap(long, short, default_value = "authority")]
        kind: String,
        /// Type classifier used to pick the mirrored entity's class
        #[clap(long)]
        typed: Option<String>,
        /// Source URI of the authority record
        #[clap(long)]
        uri: Option<String>,
    },
    /// Create a typed relationship between two entities (validated)
    Relate {
        /// The id of the source entity
        source: u64,
        /// The identifier of the property type
        property: String,
        /// The id of the target entity
        target: u64,
    },
    /// Link two content records, e.g. `link post:3 entity:7 --name depicts`
    Link {
        /// The source record as kind:id
        source: String,
        /// The target record as kind:id
        target: String,
        /// Free-text name for the link
        #[clap(long, short, default_value = "")]
        name: String,
    },
    /// Render the class hierarchy as GraphViz dot
    Dot,
    /// Prints the version of the curio binary
    Version,
}

fn open_catalog() -> Result<(PathBuf, Catalog)> {
    let cwd = current_dir()?;
    let root = find_catalog_root_from(&cwd)
        .ok_or_else(|| anyhow!("no catalogue found here or above; run `curio init` first"))?;
    let catalog = Catalog::from_directory(&root)?;
    Ok((root, catalog))
}

fn find_class(catalog: &Catalog, identifier: &str) -> Result<curio::ClassId> {
    catalog
        .ontology()
        .find_class(identifier)
        .map(|c| c.id)
        .ok_or_else(|| anyhow!("no class with identifier `{}`", identifier))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    curio::init_logging();
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let user = cli.user.as_deref();

    match cli.command {
        Commands::Init => {
            let cwd = current_dir()?;
            if cwd.join(".curio").is_dir() {
                return Err(anyhow!("a catalogue already exists in {}", cwd.display()));
            }
            Catalog::new().save_to_directory(&cwd)?;
            println!("initialized empty catalogue in {}", cwd.display());
        }
        Commands::Import { location, name } => {
            let (root, mut catalog) = open_catalog()?;
            let location = SchemaLocation::from_str(&location)?;
            let schema = curio::import_schema(&mut catalog, &location, &name)?;
            info!("imported schema {} as {}", location, schema);
            catalog.save_to_directory(&root)?;
            println!(
                "imported `{}`: {} classes, {} properties in store",
                name,
                catalog.ontology().num_classes(),
                catalog.ontology().num_properties()
            );
        }
        Commands::Status => {
            let (root, catalog) = open_catalog()?;
            println!("Catalogue at {}", root.display());
            println!("  Schemas: {}", catalog.ontology().schemas().count());
            println!("  Classes: {}", catalog.ontology().num_classes());
            println!("  Property types: {}", catalog.ontology().num_properties());
            println!("  Entities: {}", catalog.num_entities());
            println!("  Relationships: {}", catalog.num_property_instances());
            println!("  Concepts: {}", catalog.concepts().count());
            println!("  Content relations: {}", catalog.relations().count());
        }
        Commands::Classes => {
            let (_, catalog) = open_catalog()?;
            let mut classes: Vec<_> = catalog.ontology().classes().collect();
            classes.sort_by(|a, b| a.identifier.cmp(&b.identifier));
            for class in classes {
                println!("{}", class);
            }
        }
        Commands::Ancestors { identifier } => {
            let (_, catalog) = open_catalog()?;
            let class = find_class(&catalog, &identifier)?;
            let hierarchy = catalog.hierarchy();
            for id in hierarchy.ancestors(class)? {
                println!("{}", catalog.ontology().class(id)?);
            }
        }
        Commands::Descendants { identifier } => {
            let (_, catalog) = open_catalog()?;
            let class = find_class(&catalog, &identifier)?;
            let hierarchy = catalog.hierarchy();
            for id in hierarchy.descendants(class)? {
                println!("{}", catalog.ontology().class(id)?);
            }
        }
        Commands::Properties { identifier } => {
            let (_, catalog) = open_catalog()?;
            let class = find_class(&catalog, &identifier)?;
            for property in catalog.available_properties(class)? {
                println!("{}", property);
            }
        }
        Commands::Entities { identifier } => {
            let (_, catalog) = open_catalog()?;
            let class = find_class(&catalog, &identifier)?;
            for entity in catalog.instances_of_subtree(class)? {
                println!(
                    "{} `{}` ({})",
                    entity.id,
                    entity.label,
                    catalog.ontology().class(entity.instance_of)?.identifier
                );
            }
        }
        Commands::AddEntity { label, class } => {
            let (root, mut catalog) = open_catalog()?;
            let class = find_class(&catalog, &class)?;
            let id = catalog.create_entity(&label, class, user)?;
            catalog.save_to_directory(&root)?;
            println!("created entity {} `{}`", id, label);
        }
        Commands::AddConcept {
            label,
            kind,
            typed,
            uri,
        } => {
            let (root, mut catalog) = open_catalog()?;
            let kind = match kind.as_str() {
                "authority" => ConceptKind::Authority,
                "type" => ConceptKind::Type,
                other => return Err(anyhow!("unknown concept kind `{}`", other)),
            };
            let concept = catalog.add_concept(&label, kind, typed.as_deref(), uri.as_deref());
            let entity = catalog.ensure_mirrored_entity(concept, user)?;
            catalog.save_to_directory(&root)?;
            println!("created concept {} mirrored as entity {}", concept, entity);
        }
        Commands::Relate {
            source,
            property,
            target,
        } => {
            let (root, mut catalog) = open_catalog()?;
            let property = catalog
                .ontology()
                .find_property(&property)
                .map(|p| p.id)
                .ok_or_else(|| anyhow!("no property with identifier `{}`", property))?;
            let id = catalog.create_property_instance(
                EntityId(source),
                property,
                EntityId(target),
                user,
            )?;
            catalog.save_to_directory(&root)?;
            println!("created relationship {}", id);
        }
        Commands::Link {
            source,
            target,
            name,
        } => {
            let (root, mut catalog) = open_catalog()?;
            let source = ContentRef::from_str(&source)?;
            let target = ContentRef::from_str(&target)?;
            let id = catalog.relate(source, target, &name, "", None, user)?;
            catalog.save_to_directory(&root)?;
            println!("linked {} -> {} ({})", source, target, id);
        }
        Commands::Dot => {
            let (_, catalog) = open_catalog()?;
            println!("{}", catalog.hierarchy().to_dot());
        }
        Commands::Version => {
            println!("curio {}", env!("CARGO_PKG_VERSION"));
        }
    }
    Ok(())
}
