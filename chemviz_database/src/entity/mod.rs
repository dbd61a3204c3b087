use chemviz_core::model::UploadRecord;

pub mod upload_history;

impl From<upload_history::Model> for UploadRecord {
    fn from(model: upload_history::Model) -> Self {
        Self {
            id: model.id,
            filename: model.filename,
            total_equipment: model.total_equipment,
            avg_flowrate: model.avg_flowrate,
            avg_pressure: model.avg_pressure,
            avg_temperature: model.avg_temperature,
            uploaded_at: model.uploaded_at,
        }
    }
}
