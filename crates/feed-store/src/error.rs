use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    #[snafu(display("failed to connect to the store"))]
    Connect { source: sqlx::Error },
    #[snafu(display("schema bootstrap failed"))]
    Bootstrap { source: sqlx::Error },
    #[snafu(display("failed to ensure partition {name}"))]
    EnsurePartition { name: String, source: sqlx::Error },
    #[snafu(display("failed to enumerate post partitions"))]
    EnumeratePartitions { source: sqlx::Error },
    #[snafu(display("failed to drop partition {name}"))]
    DropPartition { name: String, source: sqlx::Error },
    #[snafu(display("failed to insert posts"))]
    InsertPosts { source: sqlx::Error },
    #[snafu(display("failed to delete posts"))]
    DeletePosts { source: sqlx::Error },
    #[snafu(display("failed to select candidate posts"))]
    SelectCandidates { source: sqlx::Error },
    #[snafu(display("failed to insert follows"))]
    InsertFollows { source: sqlx::Error },
    #[snafu(display("failed to delete follows"))]
    DeleteFollows { source: sqlx::Error },
    #[snafu(display("failed to check whether {did} has been primed"))]
    CheckPrimed { did: String, source: sqlx::Error },
    #[snafu(display("failed to start transaction"))]
    BeginTx { source: sqlx::Error },
    #[snafu(display("failed to commit transaction"))]
    CommitTx { source: sqlx::Error },
}
