//! AI pipeline blocks
//!
//! Each block picks a template by its option field and fills in paths and
//! sizes. Only Python is generated.

use super::{is_unset, normalize_path};
use crate::generator::CodeGenerator;
use crate::registry::{BlockEntry, BlockRegistry, Fragment};
use crate::Result;
use bf_model::{FieldSpec, Node, ShapeDescriptor};

const AI_COLOUR: &str = "200";

const PYTORCH_IMPORTS: &str = "\
import torch
import torch.nn as nn
import torch.optim as optim
import torchvision
import torchvision.transforms as transforms
from torch.utils.data import DataLoader, random_split
import matplotlib.pyplot as plt

";

const KERAS_IMPORTS: &str = "\
import tensorflow as tf
from tensorflow import keras
from tensorflow.keras.models import load_model
from tensorflow.keras import layers, models
import matplotlib.pyplot as plt
import numpy as np
import time

";

const SKLEARN_IMPORTS: &str = "\
import numpy as np
import sklearn
from sklearn.metrics import classification_report
from sklearn.metrics import accuracy_score
from sklearn.model_selection import train_test_split
from sklearn.metrics import mean_squared_error, r2_score
from sklearn.preprocessing import StandardScaler
from sklearn.decomposition import PCA
import matplotlib.pyplot as plt

";

const ALEXNET_IMPORTS: &str = "\
import tensorflow as tf
import os
import numpy as np
from tensorflow.keras.models import Sequential
from tensorflow.keras.layers import Input, Conv2D, MaxPooling2D, Flatten, Dense, Dropout
from tensorflow.keras.models import Model
from tensorflow.keras.preprocessing.image import ImageDataGenerator
from tensorflow.keras.optimizers import Adam

";

const OPENCV_IMPORTS: &str = "\
import os
import cv2
import numpy as np
import tensorflow as tf
from tensorflow.keras import layers, models
from tensorflow.keras.preprocessing.image import ImageDataGenerator
";

const MNIST_KERAS: &str = "\
# 超参数设置
params = {
    \"learning_rate\": 0.01,
    \"num_epochs\": 10,
    \"batch_size\": 64,
    \"train_size\": 50000,
    \"val_size\": 10000,
    \"test_size\": 10000,
    \"hidden_nodes\": 128
}
# 下载MNIST数据集并进行预处理
(x_train, y_train), (x_test, y_test) = keras.datasets.mnist.load_data()
# 归一化到[-1, 1]
x_train, x_test = x_train / 127.5 - 1, x_test / 127.5 - 1
# 重新划分训练集和验证集
x_val, y_val = x_train[params['train_size']:], y_train[params['train_size']:]
x_train, y_train = x_train[:params['train_size']], y_train[:params['train_size']]
# 展平输入数据
x_train = x_train.reshape(-1, 28 * 28)
x_val = x_val.reshape(-1, 28 * 28)
x_test = x_test.reshape(-1, 28 * 28)
";

const KMEANS_MODEL: &str = "\
from sklearn.cluster import KMeans

X = dataset.drop(columns=[target_column]) if target_column in dataset else dataset
scaler = StandardScaler()
X_scaled = scaler.fit_transform(X)
# 初始化 KMeans 算法，设定聚类数量为 3
kmeans = KMeans(n_clusters=3, random_state=42)
";

const CNN_MODEL: &str = "\
# 构建简单CNN模型
model = models.Sequential([
    layers.Conv2D(32, (3, 3), activation='relu', input_shape=(IMG_SIZE, IMG_SIZE, 3)),
    layers.MaxPooling2D((2, 2)),
    layers.Flatten(),
    layers.Dense(64, activation='relu'),
    layers.Dense(1, activation='sigmoid')
])

model.compile(optimizer='adam', loss='binary_crossentropy', metrics=['accuracy'])
";

const PCA_MODEL: &str = "\
# 提取特征和目标变量
X = dataset.data
y = dataset.target

# 标准化特征（PCA对特征的尺度敏感）
from sklearn.preprocessing import StandardScaler
scaler = StandardScaler()
X_scaled = scaler.fit_transform(X)

# 应用PCA降维
pca = PCA(n_components=2)
X_pca = pca.fit_transform(X_scaled)
";

const KMEANS_PLOT: &str = "\
# 获取聚类结果
cluster_labels = kmeans.labels_
plt.figure(figsize=(8, 6))
plt.scatter(X_scaled[:, 0], X_scaled[:, 1], c=cluster_labels, cmap='viridis', marker='o', edgecolor='k', s=50)
# 标记聚类中心
centers = kmeans.cluster_centers_
plt.scatter(centers[:, 0], centers[:, 1], c='red', s=200, alpha=0.75, marker='X', label='Centroids')
plt.xlabel('Feature 1')
plt.ylabel('Feature 2')
plt.title('K-Means Clustering on Dataset')
plt.legend()
plt.grid(True)
plt.savefig('output.png')
";

const PCA_PLOT: &str = "\
# 可视化降维后的数据
plt.scatter(X_pca[:, 0], X_pca[:, 1])
plt.xlabel('Principal Component 1')
plt.ylabel('Principal Component 2')
plt.title('PCA (2D projection)')
plt.savefig('output.png')

# 输出PCA结果
print(\"主成分方差解释率:\", pca.explained_variance_ratio_)
print(\"主成分:\", pca.components_)
";

const REGRESSION_REPORT: &str = "\
# 进行预测
y_pred = model.predict(X_test)

# 评估模型
mse = mean_squared_error(y_test, y_pred)
r2 = r2_score(y_test, y_pred)
print(f'Mean Squared Error: {mse:.2f}')
print(f'R^2 Score: {r2:.2f}')
";

const CLASSIFIER_REPORT: &str = "\
# 对测试集进行预测
y_pred = model.predict(X_test)

# 评估模型
accuracy = accuracy_score(y_test, y_pred)
report = classification_report(y_test, y_pred)
print(f\"分类精度: {accuracy}\")
print(\"分类报告:\")
print(report)

# 可视化预测结果
plt.scatter(y_test, y_pred)
plt.xlabel(\"True Values\")
plt.ylabel(\"Predictions\")
plt.title(\"Predictions vs True Values\")
plt.savefig('output.png')
";

const PREDICT_IMAGE: &str = "\
# 预测函数
def predict_image(img_path):
    img = cv2.imread(img_path)
    if img is None:
        return \"无法读取图片\", 0.0

    img = cv2.resize(img, (IMG_SIZE, IMG_SIZE))
    img = img / 255.0
    img = np.expand_dims(img, axis=0)

    prediction = model.predict(img)[0][0]
    return prediction > 0.5, prediction
";

/// Classic estimators built straight from sklearn
fn sklearn_model(name: &str) -> Option<(&'static str, &'static str)> {
    match name {
        "LinearRegression" => Some((
            "from sklearn.linear_model import LinearRegression",
            "LinearRegression()",
        )),
        "LogisticRegression" => Some((
            "from sklearn.linear_model import LogisticRegression",
            "LogisticRegression(max_iter=1000)",
        )),
        "KNN" => Some((
            "from sklearn.neighbors import KNeighborsClassifier",
            "KNeighborsClassifier(n_neighbors=3)",
        )),
        "CART" => Some((
            "from sklearn.tree import DecisionTreeRegressor",
            "DecisionTreeRegressor(random_state=42)",
        )),
        _ => None,
    }
}

fn split_line(test_size: &str) -> String {
    let test_size = if test_size.trim().is_empty() { "0.2" } else { test_size.trim() };
    format!(
        "X_train, X_test, y_train, y_test = train_test_split(X, y, test_size={}, random_state=42)\n",
        test_size
    )
}

fn path_field(gen: &CodeGenerator<'_>, node: &Node, name: &str) -> String {
    gen.quote(&normalize_path(&gen.field_text(node, name)))
}

fn framework(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let name = gen.field_text(node, "NAME");
    let code = match name.as_str() {
        "Pytorch" => PYTORCH_IMPORTS.to_string(),
        "Keras" => KERAS_IMPORTS.to_string(),
        "Scikit-Learn" => SKLEARN_IMPORTS.to_string(),
        "AlexNet5" => ALEXNET_IMPORTS.to_string(),
        "OpenCV" => OPENCV_IMPORTS.to_string(),
        other if is_unset(other) => String::new(),
        other => format!("import {}\n", other),
    };
    Ok(Fragment::statement(code))
}

fn import(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let from = gen.field_text(node, "fromfwork");
    let name = gen.field_text(node, "importname");
    let alias = gen.field_text(node, "asname");

    let mut code = String::new();
    if !is_unset(&from) {
        code.push_str(&format!("from {}", from));
    }
    if !is_unset(&name) {
        if !code.is_empty() {
            code.push(' ');
        }
        code.push_str(&format!("import {}", name));
    }
    if !is_unset(&alias) && !code.is_empty() {
        code.push_str(&format!(" as {}", alias));
    }
    code.push('\n');
    Ok(Fragment::statement(code))
}

fn dataset(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let name = gen.field_text(node, "datasetname");
    let test_size = gen.field_text(node, "test_size");
    let code = match name.as_str() {
        "california" => format!(
            "from sklearn.datasets import fetch_california_housing\n\n\
             # 加载数据集\n\
             california = fetch_california_housing()\n\
             X, y = california.data, california.target\n\
             # 分割数据集为训练集和测试集\n{}",
            split_line(&test_size)
        ),
        "iris" | "wine" | "digits" | "diabetes" => format!(
            "from sklearn.datasets import load_{name}\n\n\
             ds = load_{name}()\n\
             X, y = ds.data, ds.target\n\
             # 分割数据集为训练集和测试集\n{split}",
            name = name,
            split = split_line(&test_size)
        ),
        "mnist" => MNIST_KERAS.to_string(),
        "Linnerud" => "# 加载内置数据集Linnerud\n\
                       from sklearn.datasets import load_linnerud\n\
                       dataset = load_linnerud()\n"
            .to_string(),
        _ => String::new(),
    };
    Ok(Fragment::statement(code))
}

fn flow_from_directory(generator: &str, dir: &str, shuffle: bool) -> String {
    let mut code = format!(
        "{}.flow_from_directory(\n    {},\n    target_size=(IMG_SIZE, IMG_SIZE),\n    batch_size=BATCH_SIZE,\n    class_mode='binary'",
        generator, dir
    );
    if !shuffle {
        code.push_str(",\n    shuffle=False");
    }
    code.push_str("\n)\n");
    code
}

/// Image folders read through Keras generators, one per split
fn dataset_from_path(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    if is_unset(&gen.field_text(node, "datasetname")) {
        return Ok(Fragment::statement(""));
    }
    let mut code = format!(
        "# 数据集路径\nTRAIN_DIR = {}\nVAL_DIR = {}\n",
        path_field(gen, node, "train_path"),
        path_field(gen, node, "val_path")
    );
    let test_path = gen.field_text(node, "test_path");
    if !is_unset(&test_path) {
        code.push_str(&format!("TEST_DIR = {}\n", path_field(gen, node, "test_path")));
    }
    code.push_str(&format!(
        "\n# 基础配置\nIMG_SIZE = {}\nBATCH_SIZE = {}\nEPOCHS = {}\n",
        gen.field_text(node, "IMG_SIZE"),
        gen.field_text(node, "BATCH_SIZE"),
        gen.field_text(node, "EPOCHS")
    ));
    code.push_str("# 数据预处理\n");
    code.push_str("train_datagen = ImageDataGenerator(rescale=1. / 255)\n");
    code.push_str("val_datagen = ImageDataGenerator(rescale=1. / 255)\n");
    code.push_str(&format!(
        "train_generator = {}",
        flow_from_directory("train_datagen", "TRAIN_DIR", true)
    ));
    code.push_str(&format!(
        "val_generator = {}",
        flow_from_directory("val_datagen", "VAL_DIR", false)
    ));
    if !is_unset(&test_path) {
        code.push_str(&format!(
            "test_generator = {}",
            flow_from_directory("val_datagen", "TEST_DIR", false)
        ));
    }
    gen.provide_definition(
        "keras_image_data_generator",
        "from tensorflow.keras.preprocessing.image import ImageDataGenerator",
    );
    Ok(Fragment::statement(code))
}

fn dataset_from_file(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let target = gen.field_text(node, "target");
    let mut code = format!(
        "import pandas as pd\n\
         # 1. 读取 CSV 文件\n\
         dataset = pd.read_csv({})\n\
         # 获取所有的列名\n\
         all_columns = dataset.columns.tolist()\n\
         target_column = {}\n",
        path_field(gen, node, "datapath"),
        gen.quote(&target)
    );
    if !is_unset(&target) {
        code.push_str(
            "\n# 2. 准备特征和目标数据\n\
             feature_columns = [col for col in all_columns if col != target_column]\n\
             X = dataset[feature_columns]\n\
             y = dataset[target_column]\n",
        );
        code.push_str(&split_line(&gen.field_text(node, "test_size")));
    }
    Ok(Fragment::statement(code))
}

fn build_model(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let name = gen.field_text(node, "NAME");
    let code = match name.as_str() {
        "kmeans" => KMEANS_MODEL.to_string(),
        "CNN" => CNN_MODEL.to_string(),
        "PCA" => PCA_MODEL.to_string(),
        other => match sklearn_model(other) {
            Some((import, constructor)) => {
                format!("{}\n\n# 创建模型\nmodel = {}\n", import, constructor)
            }
            None => String::new(),
        },
    };
    Ok(Fragment::statement(code))
}

fn train_model(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let name = gen.field_text(node, "NAME");
    let body = match name.as_str() {
        "kmeans" => "# 训练模型\nkmeans.fit(X_scaled)\n# 获取聚类结果\ncluster_labels = kmeans.labels_\n",
        "CNN" => {
            "# 训练模型\n\
             history = model.fit(train_generator, epochs=EPOCHS, validation_data=val_generator)\n"
        }
        other if sklearn_model(other).is_some() => "# 训练模型\nmodel.fit(X_train, y_train)\n",
        _ => "",
    };
    Ok(Fragment::statement(format!("\n{}", body)))
}

fn predict_model(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let name = gen.field_text(node, "NAME");
    let code = match name.as_str() {
        "kmeans" => KMEANS_PLOT,
        "PCA" => PCA_PLOT,
        "LinearRegression" => REGRESSION_REPORT,
        "LogisticRegression" | "KNN" | "CART" => CLASSIFIER_REPORT,
        "CNN" => PREDICT_IMAGE,
        _ => "",
    };
    Ok(Fragment::statement(code))
}

fn predict_file(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let path = path_field(gen, node, "filepath");
    let code = match gen.field_text(node, "NAME").as_str() {
        "CNN" => format!(
            "test_image = {}\n\
             result, confidence = predict_image(test_image)\n\
             print(f\"\\n预测结果: {{result}}\")\n\
             print(f\"置信度: {{confidence:.2%}}\")\n",
            path
        ),
        name if is_unset(name) => String::new(),
        _ => format!("y_new = model.predict(pd.read_csv({}))\nprint(y_new)\n", path),
    };
    Ok(Fragment::statement(code))
}

fn save_model(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let raw = normalize_path(&gen.field_text(node, "modelpath"));
    if raw.trim().is_empty() {
        return Ok(Fragment::statement(""));
    }
    let path = gen.quote(&raw);
    let code = if raw.ends_with(".h5") || raw.ends_with(".keras") {
        format!("model.save({})\n", path)
    } else {
        gen.provide_definition("joblib", "import joblib");
        format!("joblib.dump(model, {})\n", path)
    };
    Ok(Fragment::statement(code))
}

fn load_model(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let path = path_field(gen, node, "modelpath");
    let code = match gen.field_text(node, "NAME").to_lowercase().as_str() {
        "keras" => format!(
            "from tensorflow.keras.models import load_model\nmodel = load_model({})\n",
            path
        ),
        "pytorch" => format!("import torch\nmodel = torch.load({})\n", path),
        _ => {
            gen.provide_definition("joblib", "import joblib");
            format!("model = joblib.load({})\n", path)
        }
    };
    Ok(Fragment::statement(code))
}

fn load_file(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let path = path_field(gen, node, "filepath");
    let file_type = gen.field_text(node, "TYPE");
    let code = match gen.field_text(node, "TOOL").as_str() {
        "Pandas" if file_type == "EXCEL" => {
            format!("import pandas as pd\ndf = pd.read_excel({})\n", path)
        }
        "Pandas" => format!("import pandas as pd\ndf = pd.read_csv({})\n", path),
        "OpenCV" => format!("import cv2\nimg = cv2.imread({})\n", path),
        "Openpyxl" => format!("from openpyxl import load_workbook\nwb = load_workbook({})\n", path),
        "Sqlite3" => format!(
            "import sqlite3\n\
             conn = sqlite3.connect({})\n\
             cursor = conn.cursor()\n\
             cursor.execute('SELECT * FROM table_name')\n\
             rows = cursor.fetchall()\n\
             for row in rows:\n    print(row)\n",
            path
        ),
        "PyPDF2" => format!(
            "import PyPDF2\n\
             with open({}, 'rb') as file:\n    \
             reader = PyPDF2.PdfReader(file)\n    \
             for page in reader.pages:\n        \
             print(page.extract_text())\n",
            path
        ),
        "Librosa" => format!(
            "import librosa\nimport librosa.display\ny, sr = librosa.load({}, sr=22050)\n",
            path
        ),
        "Python-docx" => format!(
            "from docx import Document\n\
             doc = Document({})\n\
             for para in doc.paragraphs:\n    print(para.text)\n",
            path
        ),
        "CSV工具" => format!(
            "import csv\n\
             with open({}, 'r', newline='', encoding='utf-8') as csvfile:\n    \
             reader = csv.reader(csvfile)\n    \
             for row in reader:\n        \
             print(row)\n",
            path
        ),
        "内置工具" => format!(
            "with open({}, 'r', encoding='utf-8') as file:\n    content = file.read()\n",
            path
        ),
        _ => String::new(),
    };
    Ok(Fragment::statement(code))
}

fn save_file(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let path = path_field(gen, node, "filepath");
    let code = match gen.field_text(node, "NAME").as_str() {
        "Pandas" => format!("df.to_csv({})\n", path),
        "OpenCV" => format!("cv2.imwrite({}, img)\n", path),
        "Openpyxl" => format!("wb.save({})\n", path),
        "Sqlite3" => format!(
            "conn = sqlite3.connect({})\n\
             cursor = conn.cursor()\n\
             conn.commit()\n\
             conn.close()\n",
            path
        ),
        "PyPDF2" => format!("with open({}, 'wb') as file:\n    pdf_writer.write(file)\n", path),
        "Python-docx" => format!("doc.save({})\n", path),
        "CSV工具" => format!(
            "with open({}, 'w', newline='', encoding='utf-8') as csvfile:\n    \
             writer = csv.writer(csvfile)\n    \
             writer.writerows(rows)\n",
            path
        ),
        "内置工具" => format!(
            "with open({}, 'w', encoding='utf-8') as file:\n    file.write(content)\n",
            path
        ),
        _ => String::new(),
    };
    Ok(Fragment::statement(code))
}

fn ai_block(block_type: &str, tooltip: &str) -> ShapeDescriptor {
    ShapeDescriptor::new(block_type)
        .statement(None)
        .colour(AI_COLOUR)
        .tooltip(tooltip)
}

fn split_fields(shape: ShapeDescriptor) -> ShapeDescriptor {
    shape
        .field(FieldSpec::number("train_size", 0.7))
        .field(FieldSpec::number("val_size", 0.1))
        .field(FieldSpec::number("test_size", 0.2))
}

pub fn register(registry: &mut BlockRegistry) -> Result<()> {
    let entries = [
        BlockEntry::new(
            ai_block("ai_framework", "Import an AI framework.")
                .field(FieldSpec::choice("NAME", "Scikit-Learn")),
        )
        .python(framework),
        BlockEntry::new(
            ai_block("ai_import", "from ... import ... as ...")
                .field(FieldSpec::text("fromfwork", "none"))
                .field(FieldSpec::text("importname", "none"))
                .field(FieldSpec::text("asname", "none")),
        )
        .python(import),
        BlockEntry::new(split_fields(
            ai_block("ai_dataset", "Load a built-in dataset.")
                .field(FieldSpec::choice("NAME", "Scikit-Learn"))
                .field(FieldSpec::choice("datasetname", "iris")),
        ))
        .python(dataset),
        BlockEntry::new(
            ai_block("ai_datasetfrompath", "Read image folders for training and validation.")
                .field(FieldSpec::choice("NAME", "Keras"))
                .field(FieldSpec::choice("datasetname", "none"))
                .field(FieldSpec::text("train_path", "data/train"))
                .field(FieldSpec::text("val_path", "data/val"))
                .field(FieldSpec::text("test_path", ""))
                .field(FieldSpec::number("IMG_SIZE", 128.0))
                .field(FieldSpec::number("BATCH_SIZE", 16.0))
                .field(FieldSpec::number("EPOCHS", 10.0)),
        )
        .python(dataset_from_path),
        BlockEntry::new(split_fields(
            ai_block("ai_datasetfromfile", "Read a CSV dataset.")
                .field(FieldSpec::text("datapath", "data.csv"))
                .field(FieldSpec::text("target", "")),
        ))
        .python(dataset_from_file),
        BlockEntry::new(
            ai_block("ai_buildmodel", "Create a model.")
                .field(FieldSpec::choice("NAME", "LinearRegression")),
        )
        .python(build_model),
        BlockEntry::new(
            ai_block("ai_trainmodel", "Train the model.")
                .field(FieldSpec::choice("NAME", "LinearRegression")),
        )
        .python(train_model),
        BlockEntry::new(
            ai_block("ai_predictmodel", "Evaluate the model on the test split.")
                .field(FieldSpec::choice("NAME", "LinearRegression")),
        )
        .python(predict_model),
        BlockEntry::new(
            ai_block("ai_predictfile", "Predict on a file.")
                .field(FieldSpec::choice("NAME", "CNN"))
                .field(FieldSpec::text("filepath", "")),
        )
        .python(predict_file),
        BlockEntry::new(
            ai_block("ai_savemodel", "Save the trained model.")
                .field(FieldSpec::text("modelpath", "model.pkl")),
        )
        .python(save_model),
        BlockEntry::new(
            ai_block("ai_loadmodel", "Load a saved model.")
                .field(FieldSpec::choice("NAME", "keras"))
                .field(FieldSpec::text("modelpath", "model.keras")),
        )
        .python(load_model),
        BlockEntry::new(
            ai_block("ai_loadFile", "Read a file with the chosen tool.")
                .field(FieldSpec::choice("TOOL", "Pandas"))
                .field(FieldSpec::choice("TYPE", "CSV"))
                .field(FieldSpec::text("filepath", "")),
        )
        .python(load_file),
        BlockEntry::new(
            ai_block("ai_saveFile", "Write a file with the chosen tool.")
                .field(FieldSpec::choice("NAME", "Pandas"))
                .field(FieldSpec::text("filepath", "")),
        )
        .python(save_file),
    ];
    for entry in entries {
        registry.register_entry(entry)?;
    }
    Ok(())
}
