use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use sift::cluster::{k_distance, sse_sweep, Agglomerative, Dbscan, DensityFilter, Kmeans};
use sift::tree::DecisionTree;

mod input;

use input::{drop_negative_rows, Table};

#[derive(Parser)]
#[command(version, about = "Clustering and decision trees for small CSV tables")]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct InputArgs {
    /// CSV file to read.
    #[arg(short, long)]
    input: PathBuf,

    /// The file has no header row.
    #[arg(long)]
    no_header: bool,
}

impl InputArgs {
    fn table(&self) -> Result<Table> {
        let table = Table::from_csv(&self.input, !self.no_header)?;
        debug!(
            rows = table.rows.len(),
            headers = ?table.headers,
            "loaded table"
        );
        Ok(table)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Agglomerative clustering; the first column identifies each record.
    Agglomerative {
        #[command(flatten)]
        input: InputArgs,

        /// Stop when this many clusters remain.
        #[arg(short, long, default_value_t = 1)]
        clusters: usize,
    },
    /// DBSCAN density clustering.
    Dbscan {
        #[command(flatten)]
        input: InputArgs,

        /// Neighborhood radius (exclusive).
        #[arg(short, long)]
        eps: f64,

        /// Minimum neighborhood size, the point itself included.
        #[arg(short, long)]
        min_pts: usize,
    },
    /// Sorted k-th nearest neighbor distances, for choosing DBSCAN's eps.
    Kdist {
        #[command(flatten)]
        input: InputArgs,

        #[arg(short, long)]
        k: usize,
    },
    /// K-means clustering.
    Kmeans {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        prep: PrepArgs,

        #[arg(short, long)]
        k: usize,

        /// Seed for the initial centroid sample.
        #[arg(short, long)]
        seed: Option<u64>,

        /// Round centroids to the nearest integer after every update.
        #[arg(long)]
        round: bool,

        #[arg(long, default_value_t = Kmeans::DEFAULT_MAX_ITER)]
        max_iter: usize,
    },
    /// K-means SSE for a range of k (elbow method).
    Sweep {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        prep: PrepArgs,

        #[arg(long, default_value_t = 2)]
        from: usize,

        #[arg(long, default_value_t = 10)]
        to: usize,

        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Train a decision tree; the last column is the class label.
    Tree {
        /// Labelled training CSV.
        #[arg(short, long)]
        train: PathBuf,

        /// Unlabelled CSV to classify with the trained tree.
        #[arg(short, long)]
        classify: Option<PathBuf>,

        /// Write the classifications as CSV instead of printing them.
        #[arg(short, long, requires = "classify")]
        output: Option<PathBuf>,

        /// Print the tree as JSON instead of rules.
        #[arg(long)]
        json: bool,

        #[arg(long)]
        no_header: bool,
    },
}

#[derive(Args)]
struct PrepArgs {
    /// Drop records containing negative values.
    #[arg(long)]
    drop_negative: bool,

    /// Drop records with fewer than --denoise-min neighbors within this radius.
    #[arg(long, requires = "denoise_min")]
    denoise_radius: Option<f64>,

    #[arg(long, requires = "denoise_radius")]
    denoise_min: Option<usize>,
}

impl PrepArgs {
    fn apply(&self, mut data: Vec<Vec<f64>>) -> Result<Vec<Vec<f64>>> {
        if self.drop_negative {
            data = drop_negative_rows(data);
        }
        if let (Some(radius), Some(min)) = (self.denoise_radius, self.denoise_min) {
            data = DensityFilter::new(radius, min).apply(&data)?;
        }
        if data.is_empty() {
            bail!("no records left after filtering");
        }
        debug!(rows = data.len(), "prepared data");
        Ok(data)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Agglomerative { input, clusters } => {
            let (ids, data) = input.table()?.with_identifiers()?;
            let fit = Agglomerative::new()
                .with_n_clusters(clusters)
                .fit(&data)
                .context("agglomerative clustering failed")?;

            for m in &fit.merges {
                println!(
                    "{} <- {}  distance {:.4}  size {}",
                    ids[m.kept], ids[m.absorbed], m.distance, m.size
                );
            }
            for cluster in &fit.clusters {
                let members: Vec<&str> = cluster.members.iter().map(|&i| ids[i].as_str()).collect();
                println!(
                    "cluster {} ({} members) centroid {:?}: {}",
                    ids[cluster.id],
                    members.len(),
                    cluster.centroid,
                    members.join(" ")
                );
            }
        }
        Command::Dbscan {
            input,
            eps,
            min_pts,
        } => {
            let data = input.table()?.numeric()?;
            let fit = Dbscan::new(eps, min_pts)
                .fit(&data)
                .context("dbscan failed")?;

            println!("{:>8} {:>8}  centroid", "cluster", "size");
            for s in fit.summary(&data)? {
                println!("{:>8} {:>8}  {:?}", s.cluster, s.size, s.centroid);
            }
            println!("noise points: {}", fit.noise.len());
        }
        Command::Kdist { input, k } => {
            let data = input.table()?.numeric()?;
            for d in k_distance(&data, k)? {
                println!("{d}");
            }
        }
        Command::Kmeans {
            input,
            prep,
            k,
            seed,
            round,
            max_iter,
        } => {
            let data = prep.apply(input.table()?.numeric()?)?;
            let mut model = Kmeans::new(k)
                .with_max_iter(max_iter)
                .with_centroid_decimals(round.then_some(0));
            if let Some(s) = seed {
                model = model.with_seed(s);
            }
            let fit = model.fit(&data).context("k-means failed")?;

            for c in &fit.clusters {
                println!(
                    "cluster {} ({} members) centroid {:?}",
                    c.id,
                    c.members.len(),
                    c.centroid
                );
            }
            println!(
                "k = {k}  SSE = {}  iterations = {}",
                fit.sse, fit.iterations
            );
        }
        Command::Sweep {
            input,
            prep,
            from,
            to,
            seed,
        } => {
            if from == 0 || from > to {
                bail!("invalid k range {from}..={to}");
            }
            let data = prep.apply(input.table()?.numeric()?)?;
            for (k, sse) in sse_sweep(&data, from..=to, seed)? {
                println!("{k},{sse}");
            }
        }
        Command::Tree {
            train,
            classify,
            output,
            json,
            no_header,
        } => {
            let (features, labels) = Table::from_csv(&train, !no_header)?.with_labels()?;
            let tree = DecisionTree::fit(&features, &labels)
                .with_context(|| format!("training on {} failed", train.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                print!("{}", tree.rules());
            }

            if let Some(path) = classify {
                let records = Table::from_csv(&path, !no_header)?.numeric()?;
                let predicted = tree.predict(&records)?;
                match output {
                    Some(out) => {
                        let mut wtr = csv::Writer::from_path(&out)
                            .with_context(|| format!("failed to create {}", out.display()))?;
                        for label in predicted {
                            wtr.write_record([label])?;
                        }
                        wtr.flush()?;
                    }
                    None => {
                        for label in predicted {
                            println!("{label}");
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
