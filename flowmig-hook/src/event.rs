#[derive(Debug, Clone)]
pub enum MigrationEvent {
    ValidationCompleted {
        process_instance_id: String,
        valid: bool,
        message_count: usize,
    },
    InstanceMigrated {
        process_instance_id: String,
        target_definition_id: String,
    },
    InstanceMigrationFailed {
        process_instance_id: String,
        error: String,
    },
    BatchSubmitted {
        batch_id: String,
        part_count: usize,
    },
    BatchPartCompleted {
        batch_id: String,
        part_id: String,
        result: String,
    },
    BatchCompleted {
        batch_id: String,
    },
}
